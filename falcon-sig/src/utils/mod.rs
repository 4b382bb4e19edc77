//! Utilities used in this crate which can also be generally useful downstream.

pub use winter_utils::{
    ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable, SliceReader,
};

pub mod zeroize {
    //! Securely zero memory with a simple trait ([Zeroize]) built on stable Rust primitives
    //! which guarantee the operation will not be "optimized away".
    pub use ::zeroize::{Zeroize, ZeroizeOnDrop};
}
