pub mod amount;
pub mod receipt;
pub mod warning;

pub use amount::{parse_amount, AmountError};
pub use receipt::{LayoutFormat, LineSpan, ParsedItem, PaymentMethod, Receipt, Unit};
pub use warning::{ItemWarning, ReceiptWarning};
