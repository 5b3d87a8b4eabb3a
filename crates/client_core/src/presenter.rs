//! Pure derivations from a settled [`Session`] to renderable values.

use std::fmt;

use shared::domain::{Phase, QueryMode, Source};
use url::Url;

use crate::{
    sanitize::{escape_html, sanitize_html, SanitizedHtml, LINK_REL},
    session::Session,
};

pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.80;
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.60;
pub const LINK_TARGET: &str = "_blank";
const SKELETON_LINE_WIDTHS: [u8; 4] = [100, 92, 85, 60];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_CONFIDENCE_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence indicator. `percent` drives both the label and the bar fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceBadge {
    pub tier: ConfidenceTier,
    pub percent: u8,
}

impl ConfidenceBadge {
    pub fn from_score(score: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            tier: ConfidenceTier::from_score(score),
            percent: (score * 100.0).round() as u8,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({}%)", self.tier, self.percent)
    }

    pub fn fill_width_percent(&self) -> u8 {
        self.percent
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="confidence confidence-{tier}"><span class="confidence-label">{label}</span><div class="confidence-bar"><div class="confidence-fill" style="width: {width}%"></div></div></div>"#,
            tier = self.tier.as_str().to_ascii_lowercase(),
            label = self.label(),
            width = self.fill_width_percent(),
        )
    }
}

/// Shown only for a successful session that carries a score.
pub fn confidence_badge(session: &Session) -> Option<ConfidenceBadge> {
    if session.phase() != Phase::Success || session.error_message().is_some() {
        return None;
    }
    session.confidence_score().map(ConfidenceBadge::from_score)
}

/// One cited source, opened in a new browsing context without an opener reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLink {
    /// `None` when the URL is not http(s); the label is then rendered as plain text.
    pub href: Option<String>,
    pub label: String,
    pub score: f64,
}

impl SourceLink {
    pub fn from_source(source: &Source) -> Self {
        let parsed = Url::parse(source.url.trim())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"));
        let label = if source.domain.trim().is_empty() {
            parsed
                .as_ref()
                .and_then(|url| url.host_str().map(str::to_string))
                .unwrap_or_else(|| source.url.clone())
        } else {
            source.domain.clone()
        };

        Self {
            href: parsed.map(|_| source.url.trim().to_string()),
            label,
            score: source.score,
        }
    }

    pub fn target(&self) -> &'static str {
        LINK_TARGET
    }

    pub fn rel(&self) -> &'static str {
        LINK_REL
    }

    pub fn score_label(&self) -> String {
        format!("{:.2}", self.score)
    }

    pub fn to_html(&self) -> String {
        let label = escape_html(&self.label);
        let anchor = match &self.href {
            Some(href) => format!(
                r#"<a href="{}" target="{}" rel="{}">{label}</a>"#,
                escape_html(href),
                self.target(),
                self.rel(),
            ),
            None => label,
        };
        format!(
            r#"<li class="source">{anchor} <span class="source-score">{}</span></li>"#,
            self.score_label()
        )
    }
}

pub fn source_links(session: &Session) -> Vec<SourceLink> {
    session.sources().iter().map(SourceLink::from_source).collect()
}

/// Fixed-shape placeholder shown while a request is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingSkeleton {
    pub line_widths: &'static [u8],
    pub hint: Option<&'static str>,
}

impl LoadingSkeleton {
    pub fn for_mode(mode: QueryMode) -> Self {
        Self {
            line_widths: &SKELETON_LINE_WIDTHS,
            hint: mode.latency_hint(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="skeleton" aria-busy="true">"#);
        for width in self.line_widths {
            html.push_str(&format!(
                r#"<div class="skeleton-line" style="width: {width}%"></div>"#
            ));
        }
        if let Some(hint) = self.hint {
            html.push_str(&format!(
                r#"<p class="skeleton-hint">{}</p>"#,
                escape_html(hint)
            ));
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerView {
    pub body: SanitizedHtml,
    pub confidence: Option<ConfidenceBadge>,
    pub sources: Vec<SourceLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Idle,
    Loading(LoadingSkeleton),
    Answer(AnswerView),
    Failed { banner: String },
}

impl View {
    pub fn to_html(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Loading(skeleton) => skeleton.to_html(),
            Self::Answer(answer) => {
                let mut html = String::new();
                if let Some(badge) = &answer.confidence {
                    html.push_str(&badge.to_html());
                }
                html.push_str(r#"<div class="response">"#);
                html.push_str(answer.body.as_str());
                html.push_str("</div>");
                if !answer.sources.is_empty() {
                    html.push_str(r#"<ul class="sources">"#);
                    for source in &answer.sources {
                        html.push_str(&source.to_html());
                    }
                    html.push_str("</ul>");
                }
                html
            }
            Self::Failed { banner } => format!(
                r#"<div class="error-banner" role="alert">{}</div>"#,
                escape_html(banner)
            ),
        }
    }
}

pub fn render(session: &Session) -> View {
    match session.phase() {
        Phase::Idle => View::Idle,
        Phase::Submitting => View::Loading(LoadingSkeleton::for_mode(session.mode())),
        Phase::Success => View::Answer(AnswerView {
            body: sanitize_html(session.response_html()),
            confidence: confidence_badge(session),
            sources: source_links(session),
        }),
        Phase::Error => View::Failed {
            banner: session.error_message().unwrap_or_default().to_string(),
        },
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
