use anyhow::anyhow;
use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::{connect, output_fields, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{User, UserDraft, UserInput, UserRow};
use crate::database::Repository;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a portal user; permissions follow the role")]
    Create {
        #[arg(long, help = "Email address (stored lowercased)")]
        email: String,
        #[arg(long, help = "First name")]
        first_name: String,
        #[arg(long, help = "Last name")]
        last_name: String,
        #[arg(long, env = "CAMPUS_USER_PASSWORD", help = "Password (or CAMPUS_USER_PASSWORD)")]
        password: String,
        #[arg(long, default_value = "staff", help = "admin, manager, staff or student")]
        role: String,
        #[arg(long, help = "Department")]
        department: Option<String>,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { email, first_name, last_name, password, role, department } => {
            let draft = UserDraft::create(UserInput {
                first_name: Some(first_name),
                last_name: Some(last_name),
                email: Some(email),
                password: Some(password),
                role: Some(role),
                department,
                ..Default::default()
            })?;

            let db = connect().await?;
            let repo = Repository::<UserRow>::new(db.pool().clone());
            if repo.select_by_email(&draft.email).await?.is_some() {
                return Err(anyhow!("A user with email {} already exists", draft.email));
            }
            let password_hash = hash_password(draft.password.as_deref().unwrap_or_default())?;
            let user = User::from(repo.insert(&draft, &password_hash).await?);

            output_fields(
                output_format,
                &[("id", user.id.to_string()), ("email", user.email.clone()), ("role", user.role.to_string())],
            );
            output_success(output_format, "User created", Some(json!({ "user": user })))
        }
    }
}
