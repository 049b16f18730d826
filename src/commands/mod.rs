// ABOUTME: Subcommand implementations for the import-console binary
// ABOUTME: Thin terminal layer over the library's directory, projector and wizard

pub mod connections;
pub mod imports;
pub mod wizard;

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

pub(crate) fn confirm_delete(what: &str, count: usize, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Delete {} {}?", count, what))
        .default(false)
        .interact()?;
    Ok(answer)
}
