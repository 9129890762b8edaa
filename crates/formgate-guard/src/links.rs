//! Guarded link generation and history
//!
//! A link carries an optional expiry instant and a time limit in seconds.
//! Minting the token is the issuer's job; [`LinkGenerator`] validates the
//! request, keeps an append-only history and answers status questions against
//! the clock at the moment they are asked.

use crate::clock::Clock;
use crate::engine::DEFAULT_TIME_LIMIT_SECS;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Time limits offered by the link form, in seconds.
pub const TIME_LIMIT_PRESETS_SECS: [u32; 5] = [300, 600, 900, 1800, 3600];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
	#[error("Expiry {expires_at} is not in the future")]
	ExpiryInPast { expires_at: DateTime<Utc> },
	#[error("Time limit must be at least one second")]
	ZeroTimeLimit,
	#[error("Link issuer failed: {0}")]
	Issuer(String),
	#[error("Link '{0}' not found")]
	NotFound(String),
}

pub type LinkResult<T> = Result<T, LinkError>;

/// What to put behind a new link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
	pub item_id: String,
	/// `None` means the link never expires.
	pub expires_at: Option<DateTime<Utc>>,
	pub time_limit_secs: u32,
}

impl LinkRequest {
	/// Request for `item_id` that never expires, with the default time limit.
	pub fn new(item_id: impl Into<String>) -> Self {
		Self {
			item_id: item_id.into(),
			expires_at: None,
			time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
		}
	}

	pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
		self.expires_at = expires_at;
		self
	}

	/// Seconds a respondent gets once the guard starts.
	pub fn with_time_limit(mut self, secs: u32) -> Self {
		self.time_limit_secs = secs;
		self
	}

	/// Whether the expiry instant is at or before `now`.
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}

	/// Reject a zero time limit or an expiry that is not in the future.
	///
	/// # Examples
	///
	/// ```
	/// use chrono::{DateTime, Duration, Utc};
	/// use formgate_guard::{LinkError, LinkRequest};
	///
	/// let now = DateTime::<Utc>::UNIX_EPOCH + Duration::days(1);
	/// let request = LinkRequest::new("quiz-1").with_expiry(Some(now));
	///
	/// assert!(matches!(request.validate(now), Err(LinkError::ExpiryInPast { .. })));
	/// assert!(request.validate(now - Duration::seconds(1)).is_ok());
	/// ```
	pub fn validate(&self, now: DateTime<Utc>) -> LinkResult<()> {
		if self.time_limit_secs == 0 {
			return Err(LinkError::ZeroTimeLimit);
		}
		match self.expires_at {
			Some(expires_at) if expires_at <= now => Err(LinkError::ExpiryInPast { expires_at }),
			_ => Ok(()),
		}
	}

	/// Whether the generate action should be enabled.
	pub fn can_generate(&self, now: DateTime<Utc>) -> bool {
		self.validate(now).is_ok()
	}
}

/// Issuer's answer for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedLink {
	pub id: String,
	pub url: String,
}

/// Persists links and mints their tokens
#[async_trait]
pub trait LinkIssuer: Send + Sync {
	async fn issue(&self, request: &LinkRequest) -> LinkResult<IssuedLink>;
}

/// Issuer building URLs under a base address, for tests and demos
#[derive(Debug)]
pub struct MemoryLinkIssuer {
	base_url: Url,
	issued: Mutex<Vec<LinkRequest>>,
}

impl MemoryLinkIssuer {
	/// Issue links under `base_url`, which should be able to carry path segments.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			issued: Mutex::new(Vec::new()),
		}
	}

	/// Parse `base_url`, which must be able to carry path segments.
	pub fn parse(base_url: &str) -> LinkResult<Self> {
		let url = Url::parse(base_url).map_err(|e| LinkError::Issuer(e.to_string()))?;
		if url.cannot_be_a_base() {
			return Err(LinkError::Issuer(format!("'{base_url}' cannot be a base URL")));
		}
		Ok(Self::new(url))
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Requests seen so far, oldest first.
	pub fn issued(&self) -> Vec<LinkRequest> {
		self.issued.lock().clone()
	}
}

#[async_trait]
impl LinkIssuer for MemoryLinkIssuer {
	async fn issue(&self, request: &LinkRequest) -> LinkResult<IssuedLink> {
		let token = uuid::Uuid::new_v4().simple().to_string();
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|()| LinkError::Issuer(format!("'{}' cannot be a base URL", self.base_url)))?
			.pop_if_empty()
			.push("guard")
			.push(&request.item_id);
		url.query_pairs_mut().append_pair("token", &token);
		self.issued.lock().push(request.clone());
		Ok(IssuedLink {
			id: token,
			url: url.into(),
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
	Active,
	Used,
	Expired,
}

impl fmt::Display for LinkStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LinkStatus::Active => "active",
			LinkStatus::Used => "used",
			LinkStatus::Expired => "expired",
		})
	}
}

/// A link in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLink {
	pub id: String,
	pub item_id: String,
	pub url: String,
	pub created_at: DateTime<Utc>,
	pub expires_at: Option<DateTime<Utc>>,
	pub time_limit_secs: u32,
	pub used: bool,
}

impl GeneratedLink {
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}

	/// Status as of `now`. A used link reports `Used` even after expiry.
	pub fn status(&self, now: DateTime<Utc>) -> LinkStatus {
		if self.used {
			LinkStatus::Used
		} else if self.is_expired(now) {
			LinkStatus::Expired
		} else {
			LinkStatus::Active
		}
	}
}

/// Generates links and keeps their history
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use formgate_guard::{Clock, LinkGenerator, LinkRequest, ManualClock, MemoryLinkIssuer};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::default());
/// let generator = LinkGenerator::new(
///     Arc::new(MemoryLinkIssuer::parse("https://forms.example.com/").unwrap()),
///     clock.clone(),
/// );
///
/// let past = LinkRequest::new("quiz-1").with_expiry(Some(clock.now() - Duration::minutes(1)));
/// assert!(past.is_expired(clock.now()));
/// assert!(!generator.can_generate(&past));
/// ```
pub struct LinkGenerator {
	issuer: Arc<dyn LinkIssuer>,
	clock: Arc<dyn Clock>,
	presets: Vec<u32>,
	history: Vec<GeneratedLink>,
}

impl LinkGenerator {
	pub fn new(issuer: Arc<dyn LinkIssuer>, clock: Arc<dyn Clock>) -> Self {
		Self {
			issuer,
			clock,
			presets: TIME_LIMIT_PRESETS_SECS.to_vec(),
			history: Vec::new(),
		}
	}

	/// Offer `presets` (seconds) instead of the built-in time limits.
	pub fn with_presets(mut self, presets: Vec<u32>) -> Self {
		self.presets = presets;
		self
	}

	/// Time limits to offer, in seconds.
	pub fn presets(&self) -> &[u32] {
		&self.presets
	}

	/// Whether the generate action should be enabled for `request` right now.
	pub fn can_generate(&self, request: &LinkRequest) -> bool {
		request.can_generate(self.clock.now())
	}

	/// Validate, issue and record a link.
	pub async fn generate(&mut self, request: LinkRequest) -> LinkResult<&GeneratedLink> {
		let now = self.clock.now();
		if let Err(e) = request.validate(now) {
			tracing::warn!(item_id = %request.item_id, error = %e, "link request rejected");
			return Err(e);
		}

		let issued = self.issuer.issue(&request).await?;
		tracing::info!(
			item_id = %request.item_id,
			link_id = %issued.id,
			time_limit = request.time_limit_secs,
			expires_at = ?request.expires_at,
			"link issued"
		);
		self.history.push(GeneratedLink {
			id: issued.id,
			item_id: request.item_id,
			url: issued.url,
			created_at: now,
			expires_at: request.expires_at,
			time_limit_secs: request.time_limit_secs,
			used: false,
		});
		let index = self.history.len() - 1;
		Ok(&self.history[index])
	}

	/// History, newest first.
	pub fn history(&self) -> impl Iterator<Item = &GeneratedLink> {
		self.history.iter().rev()
	}

	/// Most recently generated link.
	pub fn latest(&self) -> Option<&GeneratedLink> {
		self.history.last()
	}

	pub fn len(&self) -> usize {
		self.history.len()
	}

	pub fn is_empty(&self) -> bool {
		self.history.is_empty()
	}

	/// Record that a respondent opened the link.
	pub fn mark_used(&mut self, id: &str) -> LinkResult<()> {
		let link = self
			.history
			.iter_mut()
			.find(|link| link.id == id)
			.ok_or_else(|| LinkError::NotFound(id.to_string()))?;
		link.used = true;
		tracing::debug!(link_id = %id, "link marked used");
		Ok(())
	}

	/// Status of one link, computed now.
	pub fn status(&self, id: &str) -> LinkResult<LinkStatus> {
		let now = self.clock.now();
		self.history
			.iter()
			.find(|link| link.id == id)
			.map(|link| link.status(now))
			.ok_or_else(|| LinkError::NotFound(id.to_string()))
	}
}

impl fmt::Debug for LinkGenerator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LinkGenerator")
			.field("presets", &self.presets)
			.field("history", &self.history)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use chrono::Duration;
	use rstest::{fixture, rstest};

	struct FailingIssuer;

	#[async_trait]
	impl LinkIssuer for FailingIssuer {
		async fn issue(&self, _request: &LinkRequest) -> LinkResult<IssuedLink> {
			Err(LinkError::Issuer("service unavailable".to_string()))
		}
	}

	#[fixture]
	fn clock() -> Arc<ManualClock> {
		Arc::new(ManualClock::default())
	}

	fn generator(clock: &Arc<ManualClock>) -> LinkGenerator {
		LinkGenerator::new(
			Arc::new(MemoryLinkIssuer::parse("https://forms.example.com/").unwrap()),
			clock.clone(),
		)
	}

	#[rstest]
	fn test_request_defaults_to_fifteen_minutes() {
		// Act
		let request = LinkRequest::new("quiz-1");

		// Assert
		assert_eq!(request.time_limit_secs, 900);
		assert_eq!(request.expires_at, None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_past_expiry_is_expired_and_cannot_generate(clock: Arc<ManualClock>) {
		// Arrange
		clock.advance_secs(3600);
		let mut generator = generator(&clock);
		let request =
			LinkRequest::new("quiz-1").with_expiry(Some(clock.now() - Duration::seconds(1)));

		// Act
		let rejected = matches!(
			generator.generate(request.clone()).await,
			Err(LinkError::ExpiryInPast { .. })
		);

		// Assert
		assert!(rejected);
		assert!(request.is_expired(clock.now()));
		assert!(!generator.can_generate(&request));
		assert!(generator.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_zero_time_limit_is_rejected(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = generator(&clock);

		// Act
		let result = generator
			.generate(LinkRequest::new("quiz-1").with_time_limit(0))
			.await;

		// Assert
		assert_eq!(result.unwrap_err(), LinkError::ZeroTimeLimit);
	}

	#[rstest]
	#[tokio::test]
	async fn test_generated_link_carries_request(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = generator(&clock);
		let expires_at = clock.now() + Duration::days(1);

		// Act
		let link = generator
			.generate(
				LinkRequest::new("quiz-1")
					.with_expiry(Some(expires_at))
					.with_time_limit(600),
			)
			.await
			.unwrap()
			.clone();

		// Assert
		assert!(link.url.starts_with("https://forms.example.com/guard/quiz-1?token="));
		assert_eq!(link.expires_at, Some(expires_at));
		assert_eq!(link.time_limit_secs, 600);
		assert_eq!(link.created_at, clock.now());
		assert_eq!(link.status(clock.now()), LinkStatus::Active);
	}

	#[rstest]
	#[case("quiz-1", "https://forms.example.com/guard/quiz-1?token=")]
	#[case("a/b?c#d", "https://forms.example.com/guard/a%2Fb%3Fc%23d?token=")]
	#[tokio::test]
	async fn test_item_id_stays_one_path_segment(
		clock: Arc<ManualClock>,
		#[case] item_id: &str,
		#[case] prefix: &str,
	) {
		// Arrange
		let mut generator = generator(&clock);

		// Act
		let link = generator
			.generate(LinkRequest::new(item_id))
			.await
			.unwrap()
			.clone();

		// Assert
		assert!(link.url.starts_with(prefix), "{}", link.url);
		let parsed = Url::parse(&link.url).unwrap();
		assert_eq!(parsed.path_segments().map(|s| s.count()), Some(2));
		assert_eq!(parsed.fragment(), None);
		assert_eq!(parsed.query_pairs().count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_base_path_is_kept(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = LinkGenerator::new(
			Arc::new(MemoryLinkIssuer::parse("https://example.com/forms/").unwrap()),
			clock.clone(),
		);

		// Act
		let url = generator
			.generate(LinkRequest::new("quiz-1"))
			.await
			.unwrap()
			.url
			.clone();

		// Assert
		assert!(url.starts_with("https://example.com/forms/guard/quiz-1?token="));
	}

	#[rstest]
	fn test_opaque_base_url_is_rejected() {
		// Act
		let result = MemoryLinkIssuer::parse("mailto:forms@example.com");

		// Assert
		assert!(matches!(result, Err(LinkError::Issuer(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_history_is_newest_first(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = generator(&clock);

		// Act
		for item in ["a", "b", "c"] {
			generator.generate(LinkRequest::new(item)).await.unwrap();
			clock.advance_secs(1);
		}

		// Assert
		let items: Vec<_> = generator.history().map(|l| l.item_id.as_str()).collect();
		assert_eq!(items, vec!["c", "b", "a"]);
		assert_eq!(generator.latest().map(|l| l.item_id.as_str()), Some("c"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_status_is_computed_when_asked(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = generator(&clock);
		let id = generator
			.generate(
				LinkRequest::new("quiz-1").with_expiry(Some(clock.now() + Duration::minutes(5))),
			)
			.await
			.unwrap()
			.id
			.clone();
		assert_eq!(generator.status(&id).unwrap(), LinkStatus::Active);

		// Act
		clock.advance_secs(300);

		// Assert
		assert_eq!(generator.status(&id).unwrap(), LinkStatus::Expired);
	}

	#[rstest]
	#[tokio::test]
	async fn test_mark_used(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = generator(&clock);
		let id = generator
			.generate(LinkRequest::new("quiz-1"))
			.await
			.unwrap()
			.id
			.clone();

		// Act
		generator.mark_used(&id).unwrap();

		// Assert
		assert_eq!(generator.status(&id).unwrap(), LinkStatus::Used);
		assert_eq!(
			generator.mark_used("missing"),
			Err(LinkError::NotFound("missing".to_string()))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_issuer_failure_leaves_history_untouched(clock: Arc<ManualClock>) {
		// Arrange
		let mut generator = LinkGenerator::new(Arc::new(FailingIssuer), clock.clone());

		// Act
		let failed = matches!(
			generator.generate(LinkRequest::new("quiz-1")).await,
			Err(LinkError::Issuer(_))
		);

		// Assert
		assert!(failed);
		assert!(generator.is_empty());
	}

	#[rstest]
	fn test_default_presets() {
		// Arrange
		let clock = Arc::new(ManualClock::default());

		// Act
		let generator = generator(&clock);

		// Assert
		assert_eq!(generator.presets(), &[300, 600, 900, 1800, 3600]);
		assert!(generator.presets().contains(&DEFAULT_TIME_LIMIT_SECS));
	}
}
