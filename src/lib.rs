pub mod bundle;
pub mod cast;
pub mod codec;
pub mod docs;
pub mod error;
pub mod literal;
pub mod source;
pub mod value;
pub mod variable;
pub mod wrapper;

#[cfg(test)]
mod test_util;

// Re-export main types
pub use bundle::Bundle;
pub use cast::Cast;
pub use codec::{
    BoolTokens, Decoder, EncodedVariable, Encoder, IniDocument, IniOptions, JsonOptions,
    SourceFormat,
};
pub use docs::VariableDoc;
pub use error::{format_errors, EnvError};
pub use source::{EnvSource, ProcessEnv};
pub use value::Value;
pub use variable::Variable;
pub use wrapper::{LookupStyle, Wrapper};

// Re-export macro
pub use envwrap_macros::define_wrapper;
