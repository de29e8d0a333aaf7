mod money;

mod helpers;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Money, MoneyConversionError, USD_CURRENCY_CODE, USD_CURRENCY_CODE_LOWER};
pub use secret::Secret;
