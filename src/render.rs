use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

use crate::config::{RepoSlug, ReportWindow, DATE_FORMAT};
use crate::error::{Error, Result};
use crate::models::{Buckets, Conclusion, PullRequest};

const GLYPH_DRAFT: &str = "✏️";
const GLYPH_MERGEABLE: &str = "✅";
const GLYPH_MERGED: &str = "🎉";
const GLYPH_CLOSED: &str = "❌";

/// Shown when GitHub did not say who merged or closed a pull request.
const UNKNOWN_ACTOR: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Config(format!("unknown output format {:?}", other))),
        }
    }
}

/// Everything a finished run hands to the report.
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    pub generated_on: NaiveDate,
    pub repo: RepoSlug,
    pub window: ReportWindow,
    pub buckets: Buckets,
}

pub fn render(digest: &Digest, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(digest)),
        OutputFormat::Markdown => Ok(format_markdown(digest)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(digest)?),
    }
}

fn format_text(digest: &Digest) -> String {
    let mut output = String::new();

    let _ = write!(
        output,
        "{}\n----------\n\n- CURRENT STATUS OF PULL REQUESTS (since {})\n\n",
        digest.generated_on.format(DATE_FORMAT),
        digest.window
    );

    for (i, (bucket, prs)) in digest.buckets.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let _ = writeln!(output, "  {}:", bucket.heading());
        for pr in prs {
            let _ = writeln!(output, "    {}", pr_line(pr, &digest.repo));
        }
    }

    output.push_str("\n- DISCUSSION TOPICS:\n\n");
    output
}

fn format_markdown(digest: &Digest) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}\n", digest.generated_on.format(DATE_FORMAT));
    let _ = writeln!(
        output,
        "## Current status of pull requests (since {})\n",
        digest.window
    );

    for (bucket, prs) in digest.buckets.iter() {
        let _ = writeln!(output, "### {}\n", capitalize(bucket.heading()));
        if prs.is_empty() {
            output.push_str("_none_\n\n");
            continue;
        }
        for pr in prs {
            let _ = writeln!(output, "- {}", pr_line(pr, &digest.repo));
        }
        output.push('\n');
    }

    output.push_str("## Discussion topics\n");
    output
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Status glyphs, each independent of the others.
fn glyphs(pr: &PullRequest) -> String {
    let mut icons = String::new();
    if pr.draft {
        icons.push(' ');
        icons.push_str(GLYPH_DRAFT);
    }
    if pr.mergeable == Some(true) {
        icons.push(' ');
        icons.push_str(GLYPH_MERGEABLE);
    }
    if pr.is_merged() {
        icons.push(' ');
        icons.push_str(GLYPH_MERGED);
    }
    if pr.is_closed_unmerged() {
        icons.push(' ');
        icons.push_str(GLYPH_CLOSED);
    }
    icons
}

fn pr_line(pr: &PullRequest, repo: &RepoSlug) -> String {
    let mut line = format!(
        "https://github.com/{}/pull/{}{} ({}, {})",
        repo,
        pr.number,
        glyphs(pr),
        pr.title,
        pr.submitter()
    );

    let reason = if pr.is_merged() {
        Some(Conclusion::Merged)
    } else if pr.is_closed_unmerged() {
        Some(Conclusion::ClosedWithoutMerging)
    } else {
        None
    };
    if let Some(reason) = reason {
        let verb = match reason {
            Conclusion::Merged => "merged",
            Conclusion::ClosedWithoutMerging => "closed",
        };
        let actor = pr
            .concluded_by
            .as_ref()
            .map_or(UNKNOWN_ACTOR, |c| c.actor.as_str());
        let _ = write!(line, " {} by {}", verb, actor);
    }

    if pr.has_exact_label("stale") {
        line.push_str(" (💀 stale)");
    }
    if pr.has_exact_label("needs-rebase") {
        line.push_str(" (💀 needs rebase)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bucket, ConcludedBy, Label, User};
    use chrono::{TimeZone, Utc};

    fn record(number: u64, title: &str) -> PullRequest {
        PullRequest {
            number,
            title: title.to_string(),
            user: User {
                login: "alice".to_string(),
                company: None,
            },
            draft: false,
            mergeable: None,
            created_at: None,
            updated_at: None,
            closed_at: None,
            merged_at: None,
            labels: vec![Label {
                name: "performance".to_string(),
            }],
            merged_by: None,
            concluded_by: None,
        }
    }

    fn digest(buckets: Buckets) -> Digest {
        Digest {
            generated_on: NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
            repo: RepoSlug::parse("ceph/ceph").unwrap(),
            window: ReportWindow::parse("2024-01-10").unwrap(),
            buckets,
        }
    }

    #[test]
    fn test_text_layout() {
        let mut draft = record(101, "osd: batch writes");
        draft.draft = true;
        draft.user.company = Some("Acme".to_string());

        let merged_at = Some(Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap());
        let mut merged = record(102, "rgw: cache buckets");
        merged.merged_at = merged_at;
        merged.closed_at = merged_at;
        merged.concluded_by = Some(ConcludedBy::merged("bob"));

        let mut buckets = Buckets::default();
        buckets.push(Bucket::New, draft);
        buckets.push(Bucket::Closed, merged);

        let text = render(&digest(buckets), OutputFormat::Text).unwrap();
        let expected = "2024-01-17\n----------\n\n\
            - CURRENT STATUS OF PULL REQUESTS (since 2024-01-10)\n\n\
            \x20 new:\n\
            \x20   https://github.com/ceph/ceph/pull/101 ✏️ (osd: batch writes, alice (Acme))\n\
            \n\
            \x20 closed:\n\
            \x20   https://github.com/ceph/ceph/pull/102 🎉 (rgw: cache buckets, alice) merged by bob\n\
            \n\
            \x20 updated:\n\
            \n\
            \x20 no movement:\n\
            \n\
            - DISCUSSION TOPICS:\n\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_closed_unmerged_line() {
        let mut closed = record(7, "mds: drop lock");
        closed.closed_at = Some(Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap());
        closed.concluded_by = Some(ConcludedBy::closed("stale-bot"));
        closed.labels.push(Label { name: "stale".to_string() });
        closed.labels.push(Label { name: "needs-rebase".to_string() });

        let line = pr_line(&closed, &RepoSlug::parse("ceph/ceph").unwrap());
        assert_eq!(
            line,
            "https://github.com/ceph/ceph/pull/7 ❌ (mds: drop lock, alice) closed by stale-bot (💀 stale) (💀 needs rebase)"
        );
    }

    #[test]
    fn test_missing_actor_still_names_the_conclusion() {
        let repo = RepoSlug::parse("ceph/ceph").unwrap();
        let when = Some(Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap());

        let mut merged = record(8, "os: trim");
        merged.merged_at = when;
        merged.closed_at = when;
        assert_eq!(
            pr_line(&merged, &repo),
            "https://github.com/ceph/ceph/pull/8 🎉 (os: trim, alice) merged by unknown"
        );

        let mut closed = record(9, "os: trim");
        closed.closed_at = when;
        assert_eq!(
            pr_line(&closed, &repo),
            "https://github.com/ceph/ceph/pull/9 ❌ (os: trim, alice) closed by unknown"
        );

        let open = record(10, "os: trim");
        assert_eq!(pr_line(&open, &repo), "https://github.com/ceph/ceph/pull/10 (os: trim, alice)");
    }

    #[test]
    fn test_glyphs_are_additive() {
        let mut pr = record(1, "t");
        assert_eq!(glyphs(&pr), "");

        pr.draft = true;
        pr.mergeable = Some(true);
        assert_eq!(glyphs(&pr), " ✏️ ✅");
    }

    #[test]
    fn test_markdown_marks_empty_sections() {
        let md = render(&digest(Buckets::default()), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# 2024-01-17\n"));
        assert!(md.contains("### No movement\n\n_none_\n"));
        assert!(md.ends_with("## Discussion topics\n"));
    }

    #[test]
    fn test_json_output_parses() {
        let mut buckets = Buckets::default();
        buckets.push(Bucket::Updated, record(5, "t"));

        let json = render(&digest(buckets), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["repo"]["owner"], "ceph");
        assert_eq!(value["buckets"]["updated"][0]["number"], 5);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
