use anyhow::anyhow;
use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::{connect, output_fields, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{Admin, AdminDraft, AdminInput, AdminRow};
use crate::database::Repository;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an administrator account")]
    Create {
        #[arg(long, help = "Email address (stored lowercased)")]
        email: String,
        #[arg(long, help = "First name")]
        first_name: String,
        #[arg(long, help = "Last name")]
        last_name: String,
        #[arg(long, env = "CAMPUS_ADMIN_PASSWORD", help = "Password (or CAMPUS_ADMIN_PASSWORD)")]
        password: String,
        #[arg(long, help = "Department")]
        department: Option<String>,
        #[arg(long, help = "Do not send new-content alerts to this admin")]
        no_alerts: bool,
    },

    #[command(about = "Look up an administrator by email")]
    Find {
        #[arg(help = "Email address")]
        email: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = connect().await?;
    let repo = Repository::<AdminRow>::new(db.pool().clone());

    match cmd {
        AdminCommands::Create { email, first_name, last_name, password, department, no_alerts } => {
            let draft = AdminDraft::register(AdminInput {
                first_name: Some(first_name),
                last_name: Some(last_name),
                email: Some(email),
                department,
                password: Some(password),
                admin_alerts: Some(!no_alerts),
                ..Default::default()
            })?;
            if repo.select_by_email(&draft.email).await?.is_some() {
                return Err(anyhow!("An administrator with email {} already exists", draft.email));
            }
            let password_hash = hash_password(draft.password.as_deref().unwrap_or_default())?;
            let admin = Admin::from(repo.insert(&draft, &password_hash).await?);

            output_fields(output_format, &[("id", admin.id.to_string()), ("email", admin.email.clone())]);
            output_success(output_format, "Administrator created", Some(json!({ "admin": admin })))
        }
        AdminCommands::Find { email } => {
            let admin = repo
                .select_by_email(&email)
                .await?
                .map(Admin::from)
                .ok_or_else(|| anyhow!("No administrator with email {}", email.trim().to_lowercase()))?;

            output_fields(
                output_format,
                &[
                    ("id", admin.id.to_string()),
                    ("name", format!("{} {}", admin.first_name, admin.last_name)),
                    ("status", admin.status.to_string()),
                    ("alerts", admin.admin_alerts.to_string()),
                    ("last login", admin.last_login.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".into())),
                ],
            );
            output_success(output_format, "Administrator found", Some(json!({ "admin": admin })))
        }
    }
}
