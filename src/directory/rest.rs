//! REST directory
//!
//! Reads access-control records from a JSON record service:
//!
//! | lookup            | endpoint                                   |
//! |-------------------|--------------------------------------------|
//! | principal         | `GET /users/{user}`                        |
//! | active enrollment | `GET /courses/{course}/enrollments/{user}` |
//! | category role     | `GET /categories/{category}/roles/{user}`  |
//! | category parent   | `GET /categories/{category}`               |
//! | course category   | `GET /courses/{course}`                    |
//!
//! A 404 means the record does not exist. Any other failure is an error.

use crate::config::DirectoryConfig;
use crate::directory::types::{
    ActiveEnrollment, CategoryId, CategoryRoleGrant, CourseId, EnrollmentStatus, GlobalPrivilege,
    UserId,
};
use crate::directory::{
    CategoryRoleLookup, CategoryTree, EnrollmentLookup, GlobalPrivilegeLookup, PrincipalLookup,
};
use crate::error::{DirectoryError, DirectoryResult};
use crate::identity::Principal;
use crate::roles::{CategoryRole, CourseRole};
use crate::util::SecretString;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Deserialize)]
struct EnrollmentBody {
    role: String,
    status: EnrollmentStatus,
}

#[derive(Deserialize)]
struct CategoryRoleBody {
    role: String,
}

#[derive(Deserialize)]
struct CategoryBody {
    #[serde(default)]
    parent: Option<CategoryId>,
}

#[derive(Deserialize)]
struct CourseBody {
    #[serde(default)]
    category: Option<CategoryId>,
}

/// Directory client for the record service
pub struct RestDirectory {
    http: Client,
    base_url: String,
    token: Option<SecretString>,
    max_retries: u32,
    timeout_secs: u64,
}

impl RestDirectory {
    /// Create a new client from configuration
    pub fn new(config: &DirectoryConfig) -> DirectoryResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(format!("coursegate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DirectoryError::Request)?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build a URL from path segments, encoding each one
    fn url(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base_url, path)
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Execute a request with retries. `Ok(None)` on 404.
    async fn execute(&self, request: RequestBuilder) -> DirectoryResult<Option<Response>> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
                debug!("Retrying request (attempt {})", attempt + 1);
            }

            let req = request.try_clone().ok_or_else(|| {
                DirectoryError::Unavailable("request body cannot be cloned for retry".to_string())
            })?;

            let outcome = match req.send().await {
                Ok(response) => self.handle_response(response).await,
                Err(e) if e.is_timeout() => Err(DirectoryError::Timeout {
                    timeout_secs: self.timeout_secs,
                }),
                Err(e) => Err(DirectoryError::Request(e)),
            };

            match outcome {
                Ok(found) => return Ok(found),
                Err(e) if is_retryable(&e) => {
                    warn!("Directory request failed: {}", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| DirectoryError::Unavailable("no request attempted".to_string())))
    }

    async fn handle_response(&self, response: Response) -> DirectoryResult<Option<Response>> {
        let status = response.status();

        if status.is_success() {
            return Ok(Some(response));
        }

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DirectoryError::from_response(status.as_u16(), &body))
    }

    /// GET a record, `None` when the service reports it absent
    #[instrument(skip(self))]
    async fn fetch<T: DeserializeOwned>(
        &self,
        record: &str,
        segments: &[&str],
    ) -> DirectoryResult<Option<T>> {
        let request = self.authenticate(self.http.get(self.url(segments)));

        let Some(response) = self.execute(request).await? else {
            return Ok(None);
        };

        let data = response
            .json()
            .await
            .map_err(|e| DirectoryError::malformed(record, e.to_string()))?;

        Ok(Some(data))
    }
}

/// Longest pause between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// `100ms · 2^(attempt-1)`, capped at [`MAX_BACKOFF`]
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(100u64.saturating_mul(factor)).min(MAX_BACKOFF)
}

/// Check if an error is worth another attempt
fn is_retryable(error: &DirectoryError) -> bool {
    match error {
        DirectoryError::Request(e) => e.is_timeout() || e.is_connect(),
        DirectoryError::Timeout { .. } => true,
        DirectoryError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl PrincipalLookup for RestDirectory {
    async fn find_principal(&self, user: &UserId) -> DirectoryResult<Option<Principal>> {
        self.fetch("user", &["users", user.as_str()]).await
    }
}

#[async_trait]
impl GlobalPrivilegeLookup for RestDirectory {
    async fn find_global_privilege(
        &self,
        user: &UserId,
    ) -> DirectoryResult<Option<GlobalPrivilege>> {
        Ok(self.find_principal(user).await?.map(|p| GlobalPrivilege {
            is_privileged: p.is_privileged(),
        }))
    }
}

#[async_trait]
impl EnrollmentLookup for RestDirectory {
    async fn find_active_enrollment(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> DirectoryResult<Option<ActiveEnrollment>> {
        let body: Option<EnrollmentBody> = self
            .fetch(
                "enrollment",
                &["courses", course.as_str(), "enrollments", user.as_str()],
            )
            .await?;

        let Some(body) = body else {
            return Ok(None);
        };

        if !body.status.is_active() {
            debug!(status = %body.status, "Ignoring inactive enrollment");
            return Ok(None);
        }

        let role = CourseRole::try_parse(&body.role).ok_or_else(|| {
            DirectoryError::malformed("enrollment", format!("unknown course role '{}'", body.role))
        })?;

        Ok(Some(ActiveEnrollment { role }))
    }
}

#[async_trait]
impl CategoryRoleLookup for RestDirectory {
    async fn find_category_role(
        &self,
        user: &UserId,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryRoleGrant>> {
        let body: Option<CategoryRoleBody> = self
            .fetch(
                "category_role",
                &["categories", category.as_str(), "roles", user.as_str()],
            )
            .await?;

        body.map(|body| {
            CategoryRole::try_parse(&body.role)
                .map(|role| CategoryRoleGrant { role })
                .ok_or_else(|| {
                    DirectoryError::malformed(
                        "category_role",
                        format!("unknown category role '{}'", body.role),
                    )
                })
        })
        .transpose()
    }
}

#[async_trait]
impl CategoryTree for RestDirectory {
    async fn get_category_parent(
        &self,
        category: &CategoryId,
    ) -> DirectoryResult<Option<CategoryId>> {
        let body: Option<CategoryBody> = self
            .fetch("category", &["categories", category.as_str()])
            .await?;
        Ok(body.and_then(|b| b.parent))
    }

    async fn get_course_category(&self, course: &CourseId) -> DirectoryResult<Option<CategoryId>> {
        let body: Option<CourseBody> = self.fetch("course", &["courses", course.as_str()]).await?;
        Ok(body.and_then(|b| b.category))
    }
}
