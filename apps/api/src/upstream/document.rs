use bytes::Bytes;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::resume::grouping;
use crate::resume::session::EditorSession;
use crate::upstream::{http_client, status_error, UpstreamError};

// ────────────────────────────────────────────────────────────────────────────
// Request body (built from the saved copies of a session)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
pub struct DocumentRequest {
    pub name: String,
    pub contacts: Vec<ContactLine>,
    pub experiences: Vec<ExperienceBlock>,
    pub education: Vec<EducationBlock>,
    pub projects: Vec<ProjectBlock>,
    pub skills: Vec<SkillLine>,
    pub achievements: Vec<AchievementLine>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ContactLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ExperienceBlock {
    pub company: String,
    pub roles: Vec<RoleBlock>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RoleBlock {
    pub title: String,
    pub date: String,
    pub groups: Vec<GroupBlock>,
    /// Content in the flat legacy encoding, project headers as sentinel lines.
    pub bullets: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GroupBlock {
    pub name: Option<String>,
    pub bullets: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EducationBlock {
    pub university: String,
    pub date: String,
    pub degrees: Vec<DegreeLine>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DegreeLine {
    pub degree: String,
    pub description: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProjectBlock {
    pub name: String,
    pub date: String,
    pub description: String,
    pub bullets: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SkillLine {
    pub topic: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AchievementLine {
    pub kind: String,
    pub value: String,
}

fn non_blank(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect()
}

impl DocumentRequest {
    /// Saved state only, with blank bullets and empty contact values left out.
    pub fn from_session(session: &EditorSession) -> Self {
        let contacts = session
            .contacts()
            .saved()
            .iter()
            .filter(|f| !f.value.trim().is_empty())
            .map(|f| ContactLine {
                label: f.label.clone(),
                value: f.value.clone(),
            })
            .collect();

        let experiences = session
            .experiences()
            .saved()
            .iter()
            .map(|exp| ExperienceBlock {
                company: exp.company.clone(),
                roles: exp
                    .job_titles
                    .iter()
                    .map(|jt| RoleBlock {
                        title: jt.title.clone(),
                        date: jt.date.clone(),
                        groups: jt
                            .groups()
                            .into_iter()
                            .map(|group| GroupBlock {
                                technologies: group
                                    .name
                                    .as_ref()
                                    .and_then(|n| jt.project_technologies.get(n))
                                    .cloned()
                                    .unwrap_or_default(),
                                bullets: non_blank(group.bullets),
                                name: group.name,
                            })
                            .filter(|g| g.name.is_some() || !g.bullets.is_empty())
                            .collect(),
                        bullets: non_blank(grouping::entries_to_legacy(&jt.content)),
                    })
                    .collect(),
            })
            .collect();

        let education = session
            .education()
            .saved()
            .iter()
            .map(|edu| EducationBlock {
                university: edu.university.clone(),
                date: edu.date.clone(),
                degrees: edu
                    .degrees
                    .iter()
                    .map(|d| DegreeLine {
                        degree: d.degree.clone(),
                        description: d.description.clone(),
                    })
                    .collect(),
            })
            .collect();

        let projects = session
            .active_projects()
            .into_iter()
            .map(|p| ProjectBlock {
                name: p.name,
                date: p.date,
                description: p.description,
                bullets: non_blank(p.bullets),
                technologies: p.technologies,
            })
            .collect();

        let skills = session
            .skills()
            .saved()
            .iter()
            .map(|s| SkillLine {
                topic: s.topic.clone(),
                keywords: s.keyword_list().into_iter().map(str::to_string).collect(),
            })
            .collect();

        let achievements = session
            .achievements()
            .saved()
            .iter()
            .map(|a| AchievementLine {
                kind: a.kind.clone(),
                value: a.value.clone(),
            })
            .collect();

        Self {
            name: session.name().to_string(),
            contacts,
            experiences,
            education,
            projects,
            skills,
            achievements,
        }
    }

    pub fn default_filename(&self) -> String {
        let stem: String = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        if stem.is_empty() {
            "Resume.pdf".to_string()
        } else {
            format!("{stem}_Resume.pdf")
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct DocumentClient {
    client: Client,
    base_url: String,
}

impl DocumentClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn generate(
        &self,
        request: &DocumentRequest,
    ) -> Result<GeneratedDocument, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Document service returned {status}");
            return Err(status_error(status, text));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| request.default_filename());
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = response.bytes().await?;
        info!("Generated document {filename} ({} bytes)", bytes.len());
        Ok(GeneratedDocument {
            filename,
            content_type,
            bytes,
        })
    }
}

/// Pulls `filename` out of a `Content-Disposition` header value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::post, Router};

    use super::*;
    use crate::resume::commands::EditCommand;
    use crate::resume::document::SkillPatch;
    use crate::upstream::serve_stub;

    #[tokio::test]
    async fn test_generate_surfaces_refusals_and_failures() {
        let base = serve_stub(
            Router::new()
                .route("/forbidden/generate", post(|| async { StatusCode::FORBIDDEN }))
                .route(
                    "/broken/generate",
                    post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "renderer down") }),
                ),
        )
        .await;
        let request = DocumentRequest::from_session(&EditorSession::default());

        let blocked = DocumentClient::new(format!("{base}/forbidden"))
            .unwrap()
            .generate(&request)
            .await;
        assert!(matches!(blocked, Err(UpstreamError::Blocked { status: 403 })));

        let failed = DocumentClient::new(format!("{base}/broken"))
            .unwrap()
            .generate(&request)
            .await;
        assert!(matches!(
            failed,
            Err(UpstreamError::Failed { status: 500, ref message }) if message == "renderer down"
        ));
    }

    #[tokio::test]
    async fn test_generate_reads_filename_and_bytes() {
        let base = serve_stub(Router::new().route(
            "/generate",
            post(|| async {
                (
                    [
                        ("content-type", "application/pdf"),
                        ("content-disposition", "attachment; filename=\"Ada_CV.pdf\""),
                    ],
                    "%PDF-1.7",
                )
            }),
        ))
        .await;
        let request = DocumentRequest::from_session(&EditorSession::default());
        let document = DocumentClient::new(base)
            .unwrap()
            .generate(&request)
            .await
            .unwrap();
        assert_eq!(document.filename, "Ada_CV.pdf");
        assert_eq!(document.content_type, "application/pdf");
        assert_eq!(&document.bytes[..], b"%PDF-1.7");
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="Ada_CV.pdf""#).as_deref(),
            Some("Ada_CV.pdf")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=cv.pdf").as_deref(),
            Some("cv.pdf")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn test_default_filename_uses_name() {
        let mut session = EditorSession::default();
        session
            .apply(EditCommand::SetName {
                name: "Ada  Lovelace".to_string(),
            })
            .unwrap();
        let request = DocumentRequest::from_session(&session);
        assert_eq!(request.default_filename(), "Ada_Lovelace_Resume.pdf");
    }

    #[test]
    fn test_request_skips_blank_content() {
        let mut session = EditorSession::default();
        session.apply(EditCommand::AddExperience).unwrap();
        let id = session.apply(EditCommand::AddSkill).unwrap().unwrap();
        session
            .apply(EditCommand::UpdateSkill {
                skill_id: id,
                patch: SkillPatch {
                    topic: Some("Languages".to_string()),
                    keywords: Some("Rust, Go".to_string()),
                },
            })
            .unwrap();

        let request = DocumentRequest::from_session(&session);
        assert!(request.contacts.is_empty());
        assert!(request.experiences[0].roles[0].groups.is_empty());
        assert_eq!(request.skills[0].keywords, vec!["Rust", "Go"]);
        assert!(request.experiences[0].roles[0].bullets.is_empty());
    }

    #[test]
    fn test_request_keeps_named_groups() {
        let mut session = EditorSession::default();
        let experience_id = session.apply(EditCommand::AddExperience).unwrap().unwrap();
        let job_title_id = session.experiences().saved()[0].job_titles[0].id;
        session
            .apply(EditCommand::AddProjectGroup {
                experience_id,
                job_title_id,
                name: "Billing".to_string(),
            })
            .unwrap();

        let request = DocumentRequest::from_session(&session);
        let role = &request.experiences[0].roles[0];
        assert_eq!(role.groups.len(), 1);
        assert_eq!(role.groups[0].name.as_deref(), Some("Billing"));
        assert!(role.groups[0].bullets.is_empty());
        assert_eq!(role.bullets, vec!["__PROJECT_NAME__:Billing"]);
    }
}
