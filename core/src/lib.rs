pub mod scanner;
pub mod token;

pub use crate::scanner::{ScanError, ScanErrorKind, ScanResult, Scanner};
pub use crate::token::{Literal, Token, TokenType};
