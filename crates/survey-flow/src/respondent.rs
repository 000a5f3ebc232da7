use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Month};

/// Years after which a purchaser counts as lapsed.
pub const LAPSE_YEARS: i32 = 2;

/// Customer-status classification supplied with the respondent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
pub enum UserStatus {
    User,
    Lapser,
    #[default]
    #[serde(rename = "No Purchase", alias = "NoPurchase")]
    NoPurchase,
}

impl UserStatus {
    /// Classifies a purchase made on `purchased` as seen on `today`.
    pub fn from_purchase(purchased: Date, today: Date) -> Self {
        let year = today.year() - LAPSE_YEARS;
        // Feb 29 rolls forward to Mar 1 in a non-leap year.
        let threshold = today
            .replace_year(year)
            .or_else(|_| Date::from_calendar_date(year, Month::March, 1));
        match threshold {
            Ok(threshold) if purchased < threshold => UserStatus::Lapser,
            _ => UserStatus::User,
        }
    }
}

/// Most recent recorded purchase of the respondent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestPurchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// ISO date, optionally followed by a time part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_location: Option<String>,
}

impl LatestPurchase {
    pub fn date(&self) -> Option<Date> {
        let raw = self.purchase_date.as_deref()?;
        let day = raw.get(..10).unwrap_or(raw);
        Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
    }

    /// Product type and name joined for display.
    pub fn description(&self) -> String {
        [self.product_type.as_deref(), self.product_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read-only facts about the respondent used by routing and piping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default)]
    pub user_status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_purchase: Option<LatestPurchase>,
}

impl RespondentMetadata {
    pub fn province(&self) -> &str {
        self.province.as_deref().unwrap_or_default()
    }

    /// Recomputes the status from the purchase history; no purchase means `NoPurchase`.
    pub fn with_status_from_purchase(mut self, today: Date) -> Self {
        self.user_status = match self.latest_purchase.as_ref().and_then(LatestPurchase::date) {
            Some(purchased) => UserStatus::from_purchase(purchased, today),
            None => UserStatus::NoPurchase,
        };
        self
    }
}
