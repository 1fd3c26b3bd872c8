pub mod processor;

pub use processor::{ParsedQuery, QueryProcessor, QueryToken, TokenKind};
