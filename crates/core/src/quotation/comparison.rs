use std::fmt::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::plan::PLAN_CATALOG;
use crate::domain::quote::{discounted_premium, quoted_premium, PremiumTable};

pub const CURRENCY_MARKER: &str = "S$";

const COMPARISON_HEADER: &str = "Here are the available plans for your trip:\n";
const CHOICE_PROMPT: &str =
    "\n---\nPlease choose a plan by typing its name (e.g., 'gold'), or type 'cancel' to start over.";

pub fn format_premium(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{CURRENCY_MARKER}{rounded:.2}")
}

/// Renders one block per catalog plan present in `premiums`, in catalog order,
/// followed by the choice prompt. Plans that are missing or have an empty record
/// are skipped.
pub fn render_plan_comparison(premiums: &PremiumTable) -> String {
    let mut message = String::from(COMPARISON_HEADER);

    for entry in PLAN_CATALOG {
        let Some(record) = quoted_premium(premiums, entry.tier.key()) else {
            continue;
        };
        let price = format_premium(discounted_premium(record));
        let _ = write!(
            message,
            "\n---\n**{} Plan**\n*Premium: **{price}***\n*Med. Coverage (Overseas): up to ${}*\n",
            entry.tier.display_name(),
            entry.medical_coverage,
        );
    }

    message.push_str(CHOICE_PROMPT);
    message
}
