//! Transport and content-compilation seams.
//!
//! The engine never talks to a provider directly; it hands an
//! [`OutboundEmail`] to whatever [`MailTransport`] the embedding
//! application wires in (SMTP relay, provider API, a recording mock in
//! tests). Content compilation sits behind [`ContentRenderer`] for the
//! same reason: template engines are someone else's problem.

use async_trait::async_trait;

use mailcast_store::Campaign;

use crate::{
    error::{RenderError, TransportError},
    types::{CompiledEmail, OutboundEmail},
};

/// Outbound transmission primitive
#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Transmit one email.
    ///
    /// # Errors
    /// Any [`TransportError`]; the processor retries with backoff up to the
    /// attempt budget.
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;
}

/// Compiles campaign content for one recipient
pub trait ContentRenderer: Send + Sync + std::fmt::Debug {
    /// Produce ready-to-send content for `recipient`.
    ///
    /// # Errors
    /// [`RenderError`] if the campaign's content cannot be compiled.
    fn render(&self, campaign: &Campaign, recipient: &str) -> Result<CompiledEmail, RenderError>;
}

/// Renderer that passes the campaign snapshot through unchanged
///
/// The snapshot is already frozen, compiled content; this is the renderer
/// to use when no per-recipient templating is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotRenderer;

impl ContentRenderer for SnapshotRenderer {
    fn render(&self, campaign: &Campaign, _recipient: &str) -> Result<CompiledEmail, RenderError> {
        campaign
            .snapshot
            .as_ref()
            .map(|snapshot| CompiledEmail {
                subject: snapshot.subject.clone(),
                html: snapshot.html.clone(),
                text: snapshot.text.clone(),
            })
            .ok_or_else(|| RenderError(format!("campaign {} has no snapshot", campaign.id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailcast_store::{CampaignSnapshot, CampaignStatus};

    use super::*;

    #[test]
    fn test_snapshot_renderer_passthrough() {
        let campaign = Campaign {
            id: "c1".to_string(),
            title: "Launch".to_string(),
            status: CampaignStatus::Draft,
            snapshot: Some(CampaignSnapshot {
                subject: "We launched".to_string(),
                html: "<h1>We launched</h1>".to_string(),
                text: "We launched".to_string(),
            }),
        };

        let compiled = SnapshotRenderer
            .render(&campaign, "reader@example.com")
            .unwrap();
        assert_eq!(compiled.subject, "We launched");
        assert_eq!(compiled.html, "<h1>We launched</h1>");
    }

    #[test]
    fn test_snapshot_renderer_requires_snapshot() {
        let campaign = Campaign {
            id: "c1".to_string(),
            title: "Launch".to_string(),
            status: CampaignStatus::Draft,
            snapshot: None,
        };

        let result = SnapshotRenderer.render(&campaign, "reader@example.com");
        assert!(result.is_err());
    }
}
