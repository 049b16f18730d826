// ABOUTME: Connection subcommands: list, create with prompted secrets, bulk delete
// ABOUTME: Thin terminal layer over ConnectionDirectory

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};

use import_console::connections::{ConnectionDirectory, ConnectionDraft, Credentials};
use import_console::display::{format_timestamp, PLACEHOLDER};
use import_console::remote::ApiClient;
use import_console::CurrentUser;

use crate::KindArg;

pub async fn list(client: &ApiClient, user: &CurrentUser) -> Result<()> {
    let mut directory = ConnectionDirectory::new(user.uuid.clone());
    directory.refresh(client).await?;

    if directory.connections().is_empty() {
        println!("No connections yet.");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<8} {:<10} {:<22} DESCRIPTION",
        "ID", "NAME", "TYPE", "STATUS", "CREATED"
    );
    for c in directory.connections() {
        println!(
            "{:<6} {:<24} {:<8} {:<10} {:<22} {}",
            c.id,
            c.name,
            c.connection_type.as_deref().unwrap_or(PLACEHOLDER),
            c.status.as_deref().unwrap_or(PLACEHOLDER),
            format_timestamp(c.created_at),
            c.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn create(
    client: &ApiClient,
    user: &CurrentUser,
    kind: KindArg,
    name: String,
    description: Option<String>,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let credentials = match kind {
        KindArg::Hubspot => Credentials::Hubspot {
            access_token: Password::with_theme(&theme)
                .with_prompt("HubSpot access token")
                .interact()?,
        },
        KindArg::Five9 => Credentials::Five9 {
            username: Input::with_theme(&theme)
                .with_prompt("Five9 username")
                .interact_text()?,
            password: Password::with_theme(&theme)
                .with_prompt("Five9 password")
                .interact()?,
        },
    };

    let draft = ConnectionDraft {
        name,
        description,
        credentials,
    };
    let mut directory = ConnectionDirectory::new(user.uuid.clone());
    let message = directory.create(client, draft).await?;
    println!("{}", message);
    Ok(())
}

pub async fn delete(client: &ApiClient, user: &CurrentUser, ids: &[i64], yes: bool) -> Result<()> {
    if !super::confirm_delete("connection(s)", ids.len(), yes)? {
        return Ok(());
    }
    let mut directory = ConnectionDirectory::new(user.uuid.clone());
    let deleted = directory.delete_selected(client, ids).await?;
    println!("Deleted {} connection(s).", deleted);
    Ok(())
}
