mod peso;

pub use peso::{Peso, PesoConversionError};
