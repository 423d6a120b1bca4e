mod tokenizer;

pub use tokenizer::{Token, TokenizeMode, Tokenizer};
