//! register-codec: generic register descriptor table, payload codec, and
//! dispatch pipeline
//!
//! A device binding supplies one static table of [`RegisterDescriptor`]s;
//! everything else here is shared generic code. The codec converts framed
//! register messages to and from strongly typed values through the
//! [`RegisterValue`] trait, the [`RegisterMap`] classifies traffic by
//! register identity, and the pipeline adapters re-expose an ordered message
//! sequence as per-register typed sequences.

mod types;
pub use types::{PayloadKind, RegisterDescriptor, Timestamped};

mod error;
pub use error::{CodecError, Result};

mod map;
pub use map::RegisterMap;

mod value;
pub use value::{RegisterValue, WireValue};

pub mod codec;
pub use codec::{
    decode, decode_timestamped, decode_value, decode_value_timestamped, encode,
    encode_timestamped, encode_value,
};

pub mod pipeline;
pub use pipeline::{filter_register, format, group_by_register, parse, parse_timestamped, RegisterGroup};
