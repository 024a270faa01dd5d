#[cfg(test)]
mod decoder;
mod encoder;
mod galois;

pub(crate) use encoder::*;
