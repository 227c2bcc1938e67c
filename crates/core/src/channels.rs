//! Channel taxonomy — which marketing channels count as paid media and
//! which are owned/earned.
//!
//! Names are compared after the same title-case normalization applied to
//! the export, so configuration may use any casing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use utoipa::ToSchema;

use crate::config::ChannelsConfig;
use crate::text::title_case;

// ─── Classification ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChannelClass {
    /// Directly paid media spend.
    Paid,
    /// Direct, organic, email, affiliates and other non-paid channels.
    OwnedEarned,
    /// Present in the data but in neither list.
    Unclassified,
}

impl ChannelClass {
    pub fn display_name(&self) -> &'static str {
        match self {
            ChannelClass::Paid => "Paid Channels",
            ChannelClass::OwnedEarned => "Owned & Earned Channels",
            ChannelClass::Unclassified => "Unclassified Channels",
        }
    }
}

// ─── Taxonomy ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChannelTaxonomy {
    paid: HashSet<String>,
    owned: HashSet<String>,
    surface_unclassified: bool,
}

impl ChannelTaxonomy {
    pub fn new<P, O>(paid: P, owned: O, surface_unclassified: bool) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        O: IntoIterator,
        O::Item: AsRef<str>,
    {
        Self {
            paid: paid.into_iter().map(|c| title_case(c.as_ref())).collect(),
            owned: owned.into_iter().map(|c| title_case(c.as_ref())).collect(),
            surface_unclassified,
        }
    }

    pub fn from_config(config: &ChannelsConfig) -> Self {
        Self::new(&config.paid, &config.owned, config.surface_unclassified)
    }

    /// Classify a cleaned channel name.
    pub fn classify(&self, channel: &str) -> ChannelClass {
        if self.paid.contains(channel) {
            ChannelClass::Paid
        } else if self.owned.contains(channel) {
            ChannelClass::OwnedEarned
        } else {
            ChannelClass::Unclassified
        }
    }

    pub fn surface_unclassified(&self) -> bool {
        self.surface_unclassified
    }

    /// Channels among `channels` that fall in neither list, sorted.
    pub fn unmapped<'a, I>(&self, channels: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        channels
            .into_iter()
            .filter(|c| self.classify(c) == ChannelClass::Unclassified)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for ChannelTaxonomy {
    fn default() -> Self {
        Self::from_config(&ChannelsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_taxonomy() {
        let taxonomy = ChannelTaxonomy::default();
        assert_eq!(taxonomy.classify("Paid Social"), ChannelClass::Paid);
        assert_eq!(taxonomy.classify("Paid Search - Generic"), ChannelClass::Paid);
        assert_eq!(taxonomy.classify("Organic Search"), ChannelClass::OwnedEarned);
        assert_eq!(taxonomy.classify("Affiliates"), ChannelClass::OwnedEarned);
        assert_eq!(taxonomy.classify("Tv"), ChannelClass::Unclassified);
    }

    #[test]
    fn test_configured_names_are_normalized() {
        let taxonomy = ChannelTaxonomy::new(["PAID SOCIAL"], ["email "], true);
        assert_eq!(taxonomy.classify("Paid Social"), ChannelClass::Paid);
        assert_eq!(taxonomy.classify("Email"), ChannelClass::OwnedEarned);
    }

    #[test]
    fn test_unmapped_is_sorted_and_distinct() {
        let taxonomy = ChannelTaxonomy::default();
        let unmapped = taxonomy.unmapped(["Tv", "Email", "Radio", "Tv"]);
        assert_eq!(unmapped, vec!["Radio".to_string(), "Tv".to_string()]);
    }
}
