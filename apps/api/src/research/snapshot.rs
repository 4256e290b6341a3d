use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::companies::service::NewSource;
use crate::errors::AppError;
use crate::models::company::CompanyRow;

/// Object key for a research snapshot, e.g. `research/acme/20241014T093000Z.md`.
pub fn snapshot_key(slug: &str, at: DateTime<Utc>) -> String {
    format!("research/{slug}/{}.md", at.format("%Y%m%dT%H%M%SZ"))
}

/// Renders the research result as a markdown document.
pub fn render_research_md(
    company: &CompanyRow,
    highlights: &[String],
    sources: &[NewSource],
    at: DateTime<Utc>,
) -> String {
    let mut md = format!("# {}: Research Snapshot\n\n", company.name);
    md.push_str(&format!("- **Slug:** {}\n", company.slug));
    if let Some(industry) = &company.industry {
        md.push_str(&format!("- **Industry:** {industry}\n"));
    }
    md.push_str(&format!(
        "- **Average rating:** {:.2}\n",
        company.average_rating
    ));
    md.push_str(&format!("- **Generated:** {}\n\n", at.to_rfc3339()));

    md.push_str("## Description\n\n");
    md.push_str(company.description.as_deref().unwrap_or("_No description yet._"));
    md.push_str("\n\n");

    if !highlights.is_empty() {
        md.push_str("## Highlights\n\n");
        for highlight in highlights {
            md.push_str(&format!("- {highlight}\n"));
        }
        md.push('\n');
    }

    if !sources.is_empty() {
        md.push_str("## Sources\n\n");
        for source in sources {
            match source.published_at {
                Some(published) => md.push_str(&format!(
                    "- [{}]({}) ({})\n",
                    source.title,
                    source.url,
                    published.format("%Y-%m-%d")
                )),
                None => md.push_str(&format!("- [{}]({})\n", source.title, source.url)),
            }
        }
    }
    md
}

pub async fn upload_snapshot(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    markdown: String,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(Bytes::from(markdown)))
        .content_type("text/markdown")
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

    info!("Uploaded research snapshot to s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn company() -> CompanyRow {
        CompanyRow {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            industry: Some("Robotics".to_string()),
            description: Some("Builds warehouse robots.".to_string()),
            average_rating: 4.25,
            search_count: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 10, 14, 9, 30, 0).unwrap();
        assert_eq!(
            snapshot_key("acme", at),
            "research/acme/20241014T093000Z.md"
        );
    }

    #[test]
    fn test_render_includes_sections() {
        let at = Utc.with_ymd_and_hms(2024, 10, 14, 9, 30, 0).unwrap();
        let sources = vec![NewSource {
            title: "Acme raises Series B".to_string(),
            url: "https://news.example.com/acme".to_string(),
            snippet: None,
            published_at: Some(at),
        }];
        let md = render_research_md(
            &company(),
            &["Opened a Tokyo office".to_string()],
            &sources,
            at,
        );

        assert!(md.starts_with("# Acme"));
        assert!(md.contains("**Average rating:** 4.25"));
        assert!(md.contains("Builds warehouse robots."));
        assert!(md.contains("- Opened a Tokyo office"));
        assert!(md.contains("[Acme raises Series B](https://news.example.com/acme) (2024-10-14)"));
    }

    #[test]
    fn test_render_without_extras() {
        let mut bare = company();
        bare.description = None;
        let md = render_research_md(&bare, &[], &[], Utc::now());
        assert!(md.contains("_No description yet._"));
        assert!(!md.contains("## Highlights"));
        assert!(!md.contains("## Sources"));
    }
}
