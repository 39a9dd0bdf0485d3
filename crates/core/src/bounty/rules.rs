//! Marketplace rules enforced on every entry point.

use url::Url;

use gitmarket_shared::MarketConfig;

use crate::bounty::error::BountyError;
use crate::bounty::types::IssueRef;

/// Configurable marketplace limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRules {
    /// Smallest amount a bounty may be placed for.
    pub min_bounty_amount: i64,
    /// Credit written when an account is opened. Zero disables the bonus.
    pub signup_bonus: i64,
    /// Host pull request URLs must point at.
    pub code_host: String,
}

impl Default for MarketRules {
    fn default() -> Self {
        Self::from(&MarketConfig::default())
    }
}

impl From<&MarketConfig> for MarketRules {
    fn from(config: &MarketConfig) -> Self {
        Self {
            min_bounty_amount: config.min_bounty_amount,
            signup_bonus: config.signup_bonus,
            code_host: config.code_host.to_lowercase(),
        }
    }
}

impl MarketRules {
    /// Checks a bounty amount against the minimum.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` when `amount` is below the minimum or not positive.
    pub fn validate_amount(&self, amount: i64) -> Result<(), BountyError> {
        let minimum = self.min_bounty_amount.max(1);
        if amount < minimum {
            return Err(BountyError::InvalidAmount { amount, minimum });
        }
        Ok(())
    }

    /// Checks that `pr_url` points at a pull request on the code host.
    ///
    /// Accepts `http(s)://{code_host}/{owner}/{repo}/pull/{number}`, with an
    /// optional `www.` prefix on the host and an optional trailing slash.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` describing the first mismatch.
    pub fn validate_pr_url(&self, pr_url: &str) -> Result<(), BountyError> {
        let url = Url::parse(pr_url.trim())
            .map_err(|e| BountyError::InvalidInput(format!("pull request URL is malformed: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(BountyError::InvalidInput(format!(
                "pull request URL must use http or https, got {}",
                url.scheme()
            )));
        }

        let host = url.host_str().unwrap_or_default().to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if host != self.code_host {
            return Err(BountyError::InvalidInput(format!(
                "pull request URL must point at {}",
                self.code_host
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let is_pull = matches!(
            segments.as_slice(),
            [_owner, _repo, "pull", number] if number.parse::<u64>().is_ok_and(|n| n > 0)
        );
        if !is_pull {
            return Err(BountyError::InvalidInput(
                "pull request URL must look like /{owner}/{repo}/pull/{number}".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks the issue reference a bounty is placed on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or malformed repo, a non-positive
    /// issue number, or an empty title.
    pub fn validate_issue(&self, issue: &IssueRef) -> Result<(), BountyError> {
        let well_formed = issue
            .repo
            .split_once('/')
            .is_some_and(|(owner, name)| {
                !owner.trim().is_empty() && !name.trim().is_empty() && !name.contains('/')
            });
        if !well_formed {
            return Err(BountyError::InvalidInput(format!(
                "repository must be owner/name, got {:?}",
                issue.repo
            )));
        }
        if issue.issue_number <= 0 {
            return Err(BountyError::InvalidInput(format!(
                "issue number must be positive, got {}",
                issue.issue_number
            )));
        }
        if issue.issue_title.trim().is_empty() {
            return Err(BountyError::InvalidInput("issue title is required".to_string()));
        }
        Ok(())
    }
}
