//! Source-control statistics (GitHub user and repositories).
//!
//! Two calls per fetch (profile and repository list), issued concurrently and
//! combined into one raw payload before validation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::GithubConfig;
use crate::error::TransportError;
use crate::feed::{Provider, ProviderId};
use crate::providers::http::UpstreamHttp;
use crate::validate::{validate, Field, Schema, ValidationResult};

const TOP_LANGUAGES: usize = 5;
const TOP_REPOS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceControl {
    pub user: UserSummary,
    pub stats: RepoStats,
    pub top_repos: Vec<RepoSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub repo_count: u64,
    pub follower_count: u64,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    pub total_stars: u64,
    pub top_languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoSummary {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub language: Option<String>,
    pub url: String,
}

const USER: Schema = Schema::Object(&[
    Field::required("public_repos", Schema::Unsigned),
    Field::required("followers", Schema::Unsigned),
    Field::required("avatar_url", Schema::String),
]);

const REPO: Schema = Schema::Object(&[
    Field::required("name", Schema::String),
    Field::optional("description", Schema::Nullable(&Schema::String)),
    Field::required("stargazers_count", Schema::Unsigned),
    Field::optional("language", Schema::Nullable(&Schema::String)),
    Field::required("html_url", Schema::String),
    Field::required("fork", Schema::Boolean),
]);

static PROFILE: Schema = Schema::Object(&[
    Field::required("user", USER),
    Field::required("repos", Schema::Array(&REPO)),
]);

#[derive(Debug, Deserialize)]
struct Profile {
    user: User,
    repos: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct User {
    public_repos: u64,
    followers: u64,
    avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Repo {
    name: String,
    #[serde(default)]
    description: Option<String>,
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
    html_url: String,
    fork: bool,
}

pub struct GithubProvider {
    http: Arc<UpstreamHttp>,
    user_url: String,
    repos_url: String,
    token: Option<String>,
}

impl GithubProvider {
    pub fn new(http: Arc<UpstreamHttp>, config: &GithubConfig, token: Option<String>) -> Self {
        let user_url = format!(
            "{}/users/{}",
            config.api_url.trim_end_matches('/'),
            config.username
        );
        Self {
            http,
            repos_url: format!("{user_url}/repos"),
            user_url,
            token,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, TransportError> {
        self.http
            .send_json(ProviderId::SourceControl.as_str(), || {
                let request = self
                    .http
                    .client()
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                    .query(query);
                match &self.token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            })
            .await?
            .ok_or_else(|| TransportError::Decode(format!("empty response from {url}")))
    }
}

impl Provider for GithubProvider {
    type Key = ();
    type Output = SourceControl;

    fn id(&self) -> ProviderId {
        ProviderId::SourceControl
    }

    async fn fetch(&self, _key: &()) -> Result<Value, TransportError> {
        let (user, repos) = tokio::join!(
            self.get(&self.user_url, &[]),
            self.get(&self.repos_url, &[("per_page", "100"), ("sort", "updated")]),
        );
        Ok(json!({ "user": user?, "repos": repos? }))
    }

    fn decode(&self, _key: &(), raw: Value) -> ValidationResult<SourceControl> {
        validate::<Profile>(raw, &PROFILE).map(|profile| summarize(profile.user, profile.repos))
    }
}

fn summarize(user: User, repos: Vec<Repo>) -> SourceControl {
    let mut own: Vec<Repo> = repos.into_iter().filter(|repo| !repo.fork).collect();

    let total_stars = own.iter().map(|repo| repo.stargazers_count).sum();

    let mut languages: HashMap<&str, usize> = HashMap::new();
    for language in own.iter().filter_map(|repo| repo.language.as_deref()) {
        *languages.entry(language).or_default() += 1;
    }
    let mut languages: Vec<(&str, usize)> = languages.into_iter().collect();
    languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_languages = languages
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(language, _)| language.to_string())
        .collect();

    own.sort_by(|a, b| {
        b.stargazers_count
            .cmp(&a.stargazers_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    let top_repos = own
        .into_iter()
        .take(TOP_REPOS)
        .map(|repo| RepoSummary {
            name: repo.name,
            description: repo.description,
            stars: repo.stargazers_count,
            language: repo.language,
            url: repo.html_url,
        })
        .collect();

    SourceControl {
        user: UserSummary {
            repo_count: user.public_repos,
            follower_count: user.followers,
            avatar_url: user.avatar_url,
        },
        stats: RepoStats {
            total_stars,
            top_languages,
        },
        top_repos,
    }
}
