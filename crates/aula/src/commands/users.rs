//! `aula users`: account list, upsert and deactivation.

use secrecy::SecretString;
use tabled::Tabled;

use aula_core::{Console, NoticeLevel, Role, User, UserDraft};

use crate::cli::{GlobalOpts, OutputFormat, UserSaveArgs, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    full_name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Active")]
    active: &'static str,
    #[tabled(rename = "Last access")]
    last_access: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            full_name: util::or_dash(u.full_name.as_deref()),
            email: util::or_dash(u.email.as_deref()),
            role: u.role.to_string(),
            active: if u.active { "yes" } else { "no" },
            last_access: util::or_dash(u.last_access.as_deref()),
        }
    }
}

// The row constructor alone is not general over the borrow lifetime.
#[allow(clippy::redundant_closure)]
fn render_users(format: &OutputFormat, users: &[User]) -> String {
    output::render_list(format, users, |u| UserRow::from(u), |u| u.id.to_string())
}

pub async fn handle(console: &Console, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List => {
            let users = util::with_spinner(global, "Loading users", console.load_users()).await?;
            let out = render_users(&global.format(), &users);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Save(save) => {
            let draft = draft_from_args(save)?;
            let message = util::with_spinner(global, "Saving user", console.save_user(draft)).await?;
            if let Some(message) = message {
                output::print_notice(
                    NoticeLevel::Success,
                    &message,
                    util::color(global),
                    global.quiet,
                );
            }
            Ok(())
        }

        UsersCommand::Deactivate { id } => {
            let users = console.load_users().await?;
            let user = users
                .iter()
                .find(|u| u.id == id)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "user".into(),
                    identifier: id.to_string(),
                    list_command: "users list".into(),
                })?;
            console.request_deactivate(user);
            if util::resolve_pending(console, global).await?.is_some() {
                output::print_notice(
                    NoticeLevel::Success,
                    &format!("User '{}' deactivated", user.username),
                    util::color(global),
                    global.quiet,
                );
            }
            Ok(())
        }
    }
}

/// Turn flags into an upsert draft, prompting for the password a new
/// account needs when none was given.
fn draft_from_args(args: UserSaveArgs) -> Result<UserDraft, CliError> {
    let password = match args.password {
        Some(p) if !p.is_empty() => Some(SecretString::from(p)),
        _ if args.id.is_none() => Some(prompt_new_password(&args.username)?),
        _ => None,
    };
    let active = if args.inactive {
        Some(false)
    } else if args.active {
        Some(true)
    } else {
        None
    };
    Ok(UserDraft {
        id: args.id,
        username: args.username,
        password,
        role: Role::parse(&args.role),
        full_name: args.full_name,
        email: args.email,
        active,
    })
}

fn prompt_new_password(username: &str) -> Result<SecretString, CliError> {
    let first = rpassword::prompt_password(format!("New password for {username}: "))
        .map_err(|e| CliError::Prompt(e.to_string()))?;
    let second = rpassword::prompt_password("Repeat password: ")
        .map_err(|e| CliError::Prompt(e.to_string()))?;
    if first != second {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "passwords do not match".into(),
        });
    }
    Ok(SecretString::from(first))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(id: Option<i64>) -> UserSaveArgs {
        UserSaveArgs {
            id,
            username: "tecnico".into(),
            password: None,
            role: "Operator".into(),
            full_name: Some("Técnico de sala".into()),
            email: None,
            inactive: true,
            active: false,
        }
    }

    #[test]
    fn update_without_password_keeps_it() {
        let draft = draft_from_args(args(Some(3))).unwrap();
        assert!(!draft.is_create());
        assert!(draft.password.is_none());
        assert_eq!(draft.role, Role::Operator);
        assert_eq!(draft.active, Some(false));
    }

    #[test]
    fn user_table_lists_every_account() {
        let user = |id, username: &str, active| User {
            id,
            username: username.into(),
            full_name: None,
            email: Some(format!("{username}@aula.local")),
            role: Role::Operator,
            active,
            created_at: None,
            last_access: None,
        };
        let users = [user(1, "admin", true), user(4, "tecnico", false)];

        let table = render_users(&OutputFormat::Table, &users);
        assert!(table.contains("tecnico@aula.local"));
        assert!(table.contains("Last access"));
        assert_eq!(render_users(&OutputFormat::Plain, &users), "1\n4");
    }

    #[test]
    fn explicit_password_is_used_on_create() {
        let mut a = args(None);
        a.password = Some("s3creta".into());
        let draft = draft_from_args(a).unwrap();
        assert!(draft.is_create());
        assert!(draft.password.is_some());
    }
}
