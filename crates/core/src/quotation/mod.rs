pub mod comparison;

pub use comparison::{format_premium, render_plan_comparison, CURRENCY_MARKER};
