// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for the engine (byte-level, structural, dispatch,
//! recursion-hazard, and whitelist-rejection failures).

/// A value could not be represented on the wire under the requested format.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// A length (string/binary/array/map/ext) exceeded `u32::MAX`.
    #[error("length {len} in `{format}` exceeds the maximum encodable length")]
    LengthOverflow {
        /// The format whose length-class selection failed.
        format: &'static str,
        /// The offending length.
        len: u64,
    },
    /// `format(T, ctx)` resolved to `Typed`, and the value was packed under
    /// `Typed<Default>` — this would recurse forever at the call site.
    #[error(
        "recursive typed packing: `{type_name}`'s own format is `Typed`; \
         pack it under a concrete inner format instead of `Typed<Default>`"
    )]
    RecursiveTyped {
        /// The type whose default format loops back into `Typed`.
        type_name: &'static str,
    },
    /// A parameterized type was packed via `TypeFmt` but no
    /// `typeparamformats` binding was registered for it.
    #[error("type parameter formats not specified for `{type_name}`")]
    MissingTypeParamFormats {
        /// The parameterized type missing a binding.
        type_name: &'static str,
    },
    /// An extension payload could not be produced by `destruct`.
    #[error("extension payload malformed for type code {code}: {reason}")]
    MalformedExtension {
        /// The MessagePack ext type code.
        code: i8,
        /// Human-readable detail.
        reason: String,
    },
    /// The underlying sink failed (e.g. an `io::Write` error).
    #[error("sink error: {0}")]
    Sink(String),
    /// A `Default`-format resolution loop was detected: `format(T, ctx)`
    /// itself resolved to `Default`.
    #[error("invariant violated: format({type_name}) resolved to `Default`")]
    DefaultResolvedToDefault {
        /// The type whose binding is malformed.
        type_name: &'static str,
    },
}

/// Stream content could not satisfy the requested format/type.
#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    /// The first byte did not begin a legal encoding of the expected format.
    #[error("byte 0x{byte:02x} does not begin a `{format}` value")]
    BadPrefix {
        /// The format that rejected the byte.
        format: &'static str,
        /// The offending byte.
        byte: u8,
    },
    /// Input ended before a value completed.
    #[error("unexpected end of input while reading `{format}`")]
    Eof {
        /// The format being read when input ran out.
        format: &'static str,
    },
    /// A declared length disagreed with what the target type/schema expects.
    #[error("`{format}` expected {expected} entries, found {found}")]
    LengthMismatch {
        /// The format whose arity check failed.
        format: &'static str,
        /// The expected entry count.
        expected: usize,
        /// The entry count actually declared on the wire.
        found: usize,
    },
    /// `Struct` saw a key out of the declared field order.
    #[error(
        "struct `{type_name}` expected key `{expected}` at position {position}, found `{found}`"
    )]
    OutOfOrderKey {
        /// The struct's type name.
        type_name: &'static str,
        /// The 0-based position in the map where the mismatch occurred.
        position: usize,
        /// The field name declared at that position.
        expected: &'static str,
        /// The key actually found on the wire.
        found: String,
    },
    /// A key appeared twice in a map that must not repeat keys.
    #[error("struct `{type_name}` saw duplicate key `{key}`")]
    DuplicateKey {
        /// The struct's type name.
        type_name: &'static str,
        /// The repeated key.
        key: String,
    },
    /// `FlexibleStruct`/`UnorderedStruct` is missing a declared field.
    #[error("struct `{type_name}` is missing key `{key}`")]
    MissingKey {
        /// The struct's type name.
        type_name: &'static str,
        /// The absent field name.
        key: &'static str,
    },
    /// `UnorderedStruct` saw a key that is not among its declared field
    /// names (`FlexibleStruct` silently skips these instead).
    #[error("struct `{type_name}` saw unexpected key `{key}`")]
    UnexpectedKey {
        /// The struct's type name.
        type_name: &'static str,
        /// The unrecognized key.
        key: String,
    },
    /// A parameterized type was unpacked via `TypeFmt` but no
    /// `typeparamtypes` binding was registered for it.
    #[error("type parameter types not specified for `{type_name}`")]
    MissingTypeParamTypes {
        /// The parameterized type missing a binding.
        type_name: String,
    },
    /// `TypeFmt` decoded a namespace chain with no registered binding.
    #[error("unknown type namespace `{path}`")]
    UnknownNamespace {
        /// The dotted namespace path that failed to resolve.
        path: String,
    },
    /// `TypedValue`/`Typed<F>` decoded a concrete type that is not a subtype
    /// of the statically expected type.
    #[error("type `{found}` is not a `{expected}`")]
    TypeMismatch {
        /// The statically expected supertype.
        expected: &'static str,
        /// The concrete type name actually decoded.
        found: String,
    },
    /// `format(T, ctx)` resolved to `Typed`, and the value was unpacked
    /// under `Typed<Default>` — forbidden per `spec.md` invariant 4.
    #[error(
        "recursive typed packing: `{type_name}`'s own format is `Typed`; \
         unpack it under a concrete inner format instead of `Typed<Default>`"
    )]
    RecursiveTyped {
        /// The type whose default format loops back into `Typed`.
        type_name: String,
    },
    /// A whitelist rejected a type reconstructed via `Typed`/`TypeFmt`.
    #[error("type `{type_name}` rejected by whitelist")]
    WhitelistRejected {
        /// The rejected type's name.
        type_name: String,
    },
    /// A string payload was not valid UTF-8.
    #[error("invalid utf-8 in string payload")]
    InvalidUtf8,
    /// The underlying source failed (e.g. an `io::Read` error).
    #[error("source error: {0}")]
    Source(String),
    /// An extension's type code did not match what was requested.
    #[error("extension type code mismatch: expected {expected}, found {found}")]
    ExtensionCodeMismatch {
        /// The type code the caller asked for.
        expected: i8,
        /// The type code actually present on the wire.
        found: i8,
    },
    /// A decoded integer does not fit in the target Rust type.
    #[error("`{format}` value {value} does not fit in the target integer type")]
    IntegerOutOfRange {
        /// The format the integer was decoded under.
        format: &'static str,
        /// The out-of-range value, widened for display.
        value: i128,
    },
}

/// An internal inconsistency that should never arise in a conformant
/// binding — e.g. a `Formatted` impl whose `Format` resolves to `Default`.
#[derive(Debug, thiserror::Error)]
#[error("internal invariant violated: {0}")]
pub struct InvariantError(pub String);
