//! Page agent: a task owning one page model and the last scan, serving the
//! page protocol. The session wrapper adds liveness probing and one-shot
//! reinstall recovery.

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::engine::{
    clear_highlights, current_values, fill_forms, scan, Form, ScanOutcome, FILLED_CLASS,
};
use crate::error::{FormVaultError, Result};
use crate::page::{PageModel, PageSnapshot};
use crate::protocol::{
    FillResponse, PageRequest, PageResponse, PongResponse, ScanResponse, ValuesResponse,
};
use crate::store::{NotifyKind, Profile, StoreHandle};

/// URL schemes no agent can be installed on.
const RESTRICTED_SCHEMES: [&str; 4] = ["chrome://", "chrome-extension://", "edge://", "about:"];

pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_SCHEMES.iter().any(|s| url.starts_with(s))
}

/// Scheme, host and path of a page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

/// Split a URL into scheme/host/path without a URL crate; hosts drop
/// userinfo and port, paths drop query and fragment.
pub fn parse_url(url: &str) -> PageLocation {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let (host_part, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };
            let host = host_part.rsplit('@').next().unwrap_or(host_part);
            let host = host.split(':').next().unwrap_or(host);
            let path = path.split(['?', '#']).next().unwrap_or("/");
            PageLocation {
                scheme: scheme.to_lowercase(),
                host: host.to_lowercase(),
                path: path.to_string(),
            }
        }
        None => PageLocation {
            scheme: url.split(':').next().unwrap_or("").to_lowercase(),
            host: String::new(),
            path: String::new(),
        },
    }
}

struct AgentCall {
    request: PageRequest,
    reply: oneshot::Sender<Result<PageResponse>>,
}

/// Handle for talking to one installed page agent.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<AgentCall>,
}

impl AgentHandle {
    pub async fn request(&self, request: PageRequest) -> Result<PageResponse> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AgentCall { request, reply })
            .await
            .map_err(|_| FormVaultError::AgentUnavailable)?;
        rx.await.map_err(|_| FormVaultError::AgentUnavailable)?
    }

    /// Liveness probe: true when the agent answers a ping.
    pub async fn ping(&self) -> bool {
        matches!(
            self.request(PageRequest::Ping).await,
            Ok(PageResponse::Pong(PongResponse { success: true, .. }))
        )
    }

    #[cfg(test)]
    fn dangling() -> Self {
        let (tx, _) = mpsc::channel(1);
        Self { tx }
    }
}

/// Install an agent on a page snapshot and spawn its task.
///
/// Runs the auto-fill pass first when settings ask for it and the page's
/// domain is not excluded.
pub async fn install(
    snapshot: &PageSnapshot,
    store: StoreHandle,
    display: DisplayConfig,
) -> Result<AgentHandle> {
    if is_restricted_url(&snapshot.url) {
        return Err(FormVaultError::RestrictedPage(snapshot.url.clone()));
    }

    let mut page = PageModel::from_snapshot(snapshot);
    let location = parse_url(&page.url);
    debug!(host = %location.host, path = %location.path, "installing page agent");

    let settings = store.get_settings().await?;
    let mut last_forms: Vec<Form> = Vec::new();
    let mut auto_filled = false;
    if settings.auto_fill && !settings.is_excluded(&location.host) {
        match auto_fill(&mut page, &location, &store).await {
            Ok(Some((forms, filled))) => {
                info!(filled, "auto-filled on install");
                last_forms = forms;
                auto_filled = filled > 0;
            }
            Ok(None) => debug!("no profile for auto-fill"),
            Err(e) => warn!("auto-fill failed: {}", e),
        }
    }

    let (tx, rx) = mpsc::channel(16);
    let agent = Agent {
        page,
        location,
        last_forms,
        store,
        display,
    };
    tokio::spawn(agent.run(rx, auto_filled));
    Ok(AgentHandle { tx })
}

async fn auto_fill(
    page: &mut PageModel,
    location: &PageLocation,
    store: &StoreHandle,
) -> Result<Option<(Vec<Form>, usize)>> {
    let profiles = store
        .get_profiles(Some(location.host.as_str()), Some(location.path.as_str()))
        .await?;
    let Some(profile) = profiles.into_iter().next() else {
        return Ok(None);
    };

    let outcome = scan(page);
    clear_highlights(page);
    let filled = fill_forms(page, &outcome.forms, &profile.values);
    Ok(Some((outcome.forms, filled)))
}

struct Agent {
    page: PageModel,
    location: PageLocation,
    last_forms: Vec<Form>,
    store: StoreHandle,
    display: DisplayConfig,
}

impl Agent {
    async fn run(mut self, mut rx: mpsc::Receiver<AgentCall>, auto_filled: bool) {
        // Deadlines for clearing the transient marker classes.
        let mut highlight_at: Option<Instant> = None;
        let mut filled_at: Option<Instant> = auto_filled
            .then(|| Instant::now() + Duration::from_millis(self.display.filled_ms));

        loop {
            // Instants are copied out so the deadline branches do not hold
            // borrows the handlers need to clear.
            let highlight_deadline = highlight_at.unwrap_or_else(Instant::now);
            let filled_deadline = filled_at.unwrap_or_else(Instant::now);

            tokio::select! {
                call = rx.recv() => {
                    let Some(AgentCall { request, reply }) = call else {
                        break;
                    };
                    let response = self.handle(request, &mut highlight_at, &mut filled_at).await;
                    let _ = reply.send(response);
                }
                _ = sleep_until(highlight_deadline), if highlight_at.is_some() => {
                    clear_highlights(&mut self.page);
                    highlight_at = None;
                }
                _ = sleep_until(filled_deadline), if filled_at.is_some() => {
                    self.page.clear_class(FILLED_CLASS);
                    filled_at = None;
                }
            }
        }
        debug!(host = %self.location.host, "page agent stopped");
    }

    async fn handle(
        &mut self,
        request: PageRequest,
        highlight_at: &mut Option<Instant>,
        filled_at: &mut Option<Instant>,
    ) -> Result<PageResponse> {
        match request {
            PageRequest::Ping => Ok(PageResponse::Pong(PongResponse {
                success: true,
                message: Some("page agent is ready".to_string()),
            })),
            PageRequest::ScanForms => {
                let outcome = scan(&mut self.page);
                self.last_forms = outcome.forms.clone();
                *highlight_at = Some(Instant::now() + Duration::from_millis(self.display.highlight_ms));
                Ok(PageResponse::Scan(scan_response(outcome)))
            }
            PageRequest::QuickScan => {
                // Side-effect free: scan a copy so markers and agent state
                // stay untouched.
                let mut copy = self.page.clone();
                let outcome = scan(&mut copy);
                Ok(PageResponse::Scan(scan_response(outcome)))
            }
            PageRequest::FillForms { data } => {
                self.ensure_scanned();
                let filled = fill_forms(&mut self.page, &self.last_forms, &data);
                *filled_at = Some(Instant::now() + Duration::from_millis(self.display.filled_ms));
                Ok(PageResponse::Fill(FillResponse {
                    success: true,
                    filled_count: filled,
                    message: None,
                }))
            }
            PageRequest::GetCurrentValues => {
                self.ensure_scanned();
                let values = current_values(&self.page, &self.last_forms);
                Ok(PageResponse::Values(ValuesResponse {
                    success: true,
                    values,
                }))
            }
            PageRequest::QuickFill => {
                let outcome = scan(&mut self.page);
                clear_highlights(&mut self.page);
                self.last_forms = outcome.forms.clone();

                let Some(profile) = self.best_profile().await? else {
                    return Err(FormVaultError::NoMatchingProfile);
                };
                let filled = fill_forms(&mut self.page, &self.last_forms, &profile.values);
                *filled_at = Some(Instant::now() + Duration::from_millis(self.display.filled_ms));
                self.notify(
                    NotifyKind::Success,
                    format!("Filled {} fields from \"{}\"", filled, profile.name),
                )
                .await;
                Ok(PageResponse::Fill(FillResponse {
                    success: true,
                    filled_count: filled,
                    message: Some(profile.name),
                }))
            }
        }
    }

    /// Fill and value reads operate on the last scan; when none happened
    /// yet, scan quietly first.
    fn ensure_scanned(&mut self) {
        if self.last_forms.is_empty() {
            let outcome = scan(&mut self.page);
            clear_highlights(&mut self.page);
            self.last_forms = outcome.forms;
        }
    }

    /// The most recently written profile for this page.
    async fn best_profile(&self) -> Result<Option<Profile>> {
        let profiles = self
            .store
            .get_profiles(
                Some(self.location.host.as_str()),
                Some(self.location.path.as_str()),
            )
            .await?;
        Ok(profiles.into_iter().next())
    }

    async fn notify(&self, kind: NotifyKind, message: String) {
        let gated = match self.store.get_settings().await {
            Ok(settings) => settings.show_notifications,
            Err(_) => false,
        };
        if gated {
            if let Err(e) = self.store.notify(kind, message).await {
                warn!("notification dropped: {}", e);
            }
        }
    }
}

fn scan_response(outcome: ScanOutcome) -> ScanResponse {
    ScanResponse {
        success: true,
        forms: outcome.forms,
        total_fields: outcome.total_fields,
        total_inputs: outcome.total_inputs,
        message: None,
    }
}

/// One page plus its agent, with ping / reinstall-once recovery.
pub struct PageSession {
    snapshot: PageSnapshot,
    store: StoreHandle,
    display: DisplayConfig,
    agent: Option<AgentHandle>,
}

impl PageSession {
    pub fn new(snapshot: PageSnapshot, store: StoreHandle, display: DisplayConfig) -> Self {
        Self {
            snapshot,
            store,
            display,
            agent: None,
        }
    }

    async fn install(&self) -> Result<AgentHandle> {
        install(&self.snapshot, self.store.clone(), self.display.clone()).await
    }

    /// Send a request, installing or reinstalling the agent as needed.
    /// A restricted page fails immediately; a dead agent gets exactly one
    /// reinstall before the error surfaces.
    pub async fn send(&mut self, request: PageRequest) -> Result<PageResponse> {
        if is_restricted_url(&self.snapshot.url) {
            return Err(FormVaultError::RestrictedPage(self.snapshot.url.clone()));
        }

        if self.agent.is_none() {
            self.agent = Some(self.install().await?);
        }

        let agent = self.agent.as_ref().ok_or(FormVaultError::AgentUnavailable)?;
        if !agent.ping().await {
            warn!("page agent not responding, reinstalling");
            let fresh = self.install().await?;
            if !fresh.ping().await {
                self.agent = None;
                return Err(FormVaultError::AgentUnavailable);
            }
            self.agent = Some(fresh);
        }

        let agent = self.agent.as_ref().ok_or(FormVaultError::AgentUnavailable)?;
        agent.request(request).await
    }

    pub fn location(&self) -> PageLocation {
        parse_url(&self.snapshot.url)
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        &self.snapshot
    }
}
