// ABOUTME: Interactive terminal front end for the new-import wizard
// ABOUTME: Renders each step with dialoguer prompts and drives WizardController

use anyhow::Result;
use chrono::{Local, NaiveDateTime, Weekday};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

use import_console::display::{format_long_date, PLACEHOLDER};
use import_console::remote::ApiClient;
use import_console::wizard::{Recurrence, ScheduleForm, Step, StepCandidates, WizardController};
use import_console::CurrentUser;

const INPUT_DATETIME: &str = "%Y-%m-%d %H:%M";

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Sun, "Sunday"),
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
];

enum Nav {
    Next,
    Back,
    Stay,
    Cancel,
}

enum Pick {
    Connection(i64),
    List(String),
    DialingList(String),
}

pub async fn run(client: &ApiClient, user: &CurrentUser) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut wizard = WizardController::new(Some(user.uuid.clone())).with_refresh_callback(|| {
        info!("Import saved; `import-console imports list` shows it");
    });
    let mut form = ScheduleForm::default();

    while !wizard.is_closed() {
        let step = wizard.step();
        println!("\nStep {} of 6: {}", step.number(), step.title());

        let nav = match step {
            Step::Schedule => schedule_step(&theme, &mut wizard, client, &mut form).await?,
            Step::FieldMapping => {
                load(&mut wizard, client).await?;
                mapping_step(&theme, &mut wizard)?
            }
            _ => {
                load(&mut wizard, client).await?;
                selection_step(&theme, &mut wizard)?
            }
        };

        match nav {
            Nav::Next => {
                if let Err(e) = wizard.advance() {
                    eprintln!("{}", e);
                }
            }
            Nav::Back => {
                wizard.back();
            }
            Nav::Stay => {}
            Nav::Cancel => wizard.close(),
        }
    }
    Ok(())
}

async fn load(wizard: &mut WizardController, client: &ApiClient) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Loading...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = wizard.load(client).await;
    spinner.finish_and_clear();

    match result {
        Err(e) => eprintln!("Failed to load: {}", e),
        Ok(()) => {
            if let Some(message) = wizard.last_error() {
                eprintln!("Some options failed to load: {}", message);
            }
        }
    }
    Ok(())
}

fn with_size(name: &str, size: Option<&str>) -> String {
    format!("{} ({})", name, size.unwrap_or(PLACEHOLDER))
}

fn selection_step(theme: &ColorfulTheme, wizard: &mut WizardController) -> Result<Nav> {
    let selections = wizard.session().selections.clone();
    let (labels, picks, current): (Vec<String>, Vec<Pick>, Option<usize>) =
        match wizard.candidates() {
            StepCandidates::Connections(connections) => {
                let chosen = match wizard.step() {
                    Step::SourceConnection => selections.hubspot_connection_id,
                    _ => selections.five9_connection_id,
                };
                (
                    connections
                        .iter()
                        .map(|c| match c.description.as_deref() {
                            Some(d) if !d.is_empty() => format!("{} - {}", c.name, d),
                            _ => c.name.clone(),
                        })
                        .collect(),
                    connections.iter().map(|c| Pick::Connection(c.id)).collect(),
                    connections.iter().position(|c| Some(c.id) == chosen),
                )
            }
            StepCandidates::Lists(lists) => (
                lists
                    .iter()
                    .map(|l| with_size(&l.name, l.list_size.as_deref()))
                    .collect(),
                lists.iter().map(|l| Pick::List(l.list_id.clone())).collect(),
                lists
                    .iter()
                    .position(|l| selections.hubspot_list_id.as_deref() == Some(&l.list_id)),
            ),
            StepCandidates::DialingLists(lists) => (
                lists
                    .iter()
                    .map(|l| with_size(&l.name, l.size.as_deref()))
                    .collect(),
                lists
                    .iter()
                    .map(|l| Pick::DialingList(l.name.clone()))
                    .collect(),
                lists
                    .iter()
                    .position(|l| selections.five9_dialing_list.as_deref() == Some(&l.name)),
            ),
            _ => (Vec::new(), Vec::new(), None),
        };

    if labels.is_empty() {
        println!("Nothing available for this step.");
    }

    let mut items = labels;
    let first_nav = items.len();
    items.push("Retry".to_string());
    let has_back = wizard.step() != Step::SourceConnection;
    if has_back {
        items.push("Back".to_string());
    }
    items.push("Cancel".to_string());

    let choice = Select::with_theme(theme)
        .with_prompt(wizard.step().title())
        .items(&items)
        .default(current.unwrap_or(0))
        .interact_opt()?;

    let Some(index) = choice else {
        return Ok(Nav::Cancel);
    };
    if index >= first_nav {
        return Ok(match (index - first_nav, has_back) {
            (0, _) => Nav::Stay,
            (1, true) => Nav::Back,
            _ => Nav::Cancel,
        });
    }

    let selected = match &picks[index] {
        Pick::Connection(id) => match wizard.step() {
            Step::SourceConnection => wizard.select_hubspot_connection(*id),
            _ => wizard.select_five9_connection(*id),
        },
        Pick::List(list_id) => wizard.select_hubspot_list(list_id),
        Pick::DialingList(name) => wizard.select_dialing_list(name),
    };
    match selected {
        Ok(()) => Ok(Nav::Next),
        Err(e) => {
            eprintln!("{}", e);
            Ok(Nav::Stay)
        }
    }
}

fn print_mappings(wizard: &WizardController) {
    let mapping = wizard.mapping();
    if mapping.is_empty() {
        println!("No mappings yet.");
        return;
    }
    for entry in mapping.entries() {
        println!(
            "  [{}] {:<3} {:<24} -> {}",
            if mapping.selected().contains(&entry.id) { "x" } else { " " },
            entry.id,
            entry.hubspot_property,
            entry.five9_field
        );
    }
}

fn mapping_step(theme: &ColorfulTheme, wizard: &mut WizardController) -> Result<Nav> {
    const ACTIONS: [&str; 6] = [
        "Auto-map conventional fields",
        "Add mapping",
        "Remove mappings",
        "Next",
        "Back",
        "Cancel",
    ];

    loop {
        print_mappings(wizard);
        let choice = Select::with_theme(theme)
            .with_prompt("Field mapping")
            .items(&ACTIONS)
            .default(0)
            .interact_opt()?;

        let outcome = match choice {
            Some(0) => wizard
                .auto_map()
                .map(|added| println!("Added {} mapping(s).", added)),
            Some(1) => add_mapping(theme, wizard)?,
            Some(2) => remove_mappings(theme, wizard)?,
            Some(3) => return Ok(Nav::Next),
            Some(4) => return Ok(Nav::Back),
            _ => return Ok(Nav::Cancel),
        };
        if let Err(e) = outcome {
            eprintln!("{}", e);
        }
    }
}

fn add_mapping(
    theme: &ColorfulTheme,
    wizard: &mut WizardController,
) -> Result<import_console::Result<()>> {
    let StepCandidates::Catalog(catalog) = wizard.candidates().clone() else {
        return Ok(Ok(()));
    };

    let Some(property) = FuzzySelect::with_theme(theme)
        .with_prompt("HubSpot property")
        .items(&catalog.properties)
        .interact_opt()?
    else {
        return Ok(Ok(()));
    };
    let Some(field) = FuzzySelect::with_theme(theme)
        .with_prompt("Five9 contact field")
        .items(&catalog.contact_fields)
        .interact_opt()?
    else {
        return Ok(Ok(()));
    };

    Ok(wizard
        .add_mapping(&catalog.properties[property], &catalog.contact_fields[field])
        .map(|_| ()))
}

fn remove_mappings(
    theme: &ColorfulTheme,
    wizard: &mut WizardController,
) -> Result<import_console::Result<()>> {
    let entries = wizard.mapping().entries().to_vec();
    if entries.is_empty() {
        return Ok(Ok(()));
    }
    let labels: Vec<String> = entries
        .iter()
        .map(|e| format!("{} -> {}", e.hubspot_property, e.five9_field))
        .collect();
    let defaults: Vec<bool> = entries
        .iter()
        .map(|e| wizard.mapping().selected().contains(&e.id))
        .collect();

    let Some(picked) = MultiSelect::with_theme(theme)
        .with_prompt("Select mappings to remove")
        .items(&labels)
        .defaults(&defaults)
        .interact_opt()?
    else {
        return Ok(Ok(()));
    };

    let ids: BTreeSet<_> = picked.into_iter().map(|i| entries[i].id).collect();
    Ok(wizard
        .remove_mappings(&ids)
        .map(|removed| println!("Removed {} mapping(s).", removed)))
}

fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    NaiveDateTime::parse_from_str(input, INPUT_DATETIME)
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn prompt_datetime(
    theme: &ColorfulTheme,
    prompt: &str,
    initial: Option<NaiveDateTime>,
) -> Result<NaiveDateTime> {
    loop {
        let mut input = Input::<String>::with_theme(theme)
            .with_prompt(format!("{} (YYYY-MM-DD HH:MM)", prompt));
        if let Some(initial) = initial {
            input = input.with_initial_text(initial.format(INPUT_DATETIME).to_string());
        }
        let value = input.interact_text()?;
        match parse_datetime(&value) {
            Some(parsed) => return Ok(parsed),
            None => eprintln!("Expected YYYY-MM-DD HH:MM"),
        }
    }
}

fn prompt_recurrence(
    theme: &ColorfulTheme,
    previous: Option<&Recurrence>,
) -> Result<Option<Recurrence>> {
    let kinds = ["Once", "Daily", "Monthly", "Yearly"];
    let default = match previous {
        None => 0,
        Some(Recurrence::Daily { .. }) => 1,
        Some(Recurrence::Monthly { .. }) => 2,
        Some(Recurrence::Yearly) => 3,
    };
    let kind = Select::with_theme(theme)
        .with_prompt("Repeat")
        .items(&kinds)
        .default(default)
        .interact()?;

    Ok(match kind {
        1 => {
            let chosen: Vec<bool> = WEEKDAYS
                .iter()
                .map(|(day, _)| match previous {
                    Some(Recurrence::Daily { days }) => days.contains(day),
                    _ => false,
                })
                .collect();
            let labels: Vec<&str> = WEEKDAYS.iter().map(|(_, label)| *label).collect();
            let picked = MultiSelect::with_theme(theme)
                .with_prompt("Run on")
                .items(&labels)
                .defaults(&chosen)
                .interact()?;
            Some(Recurrence::Daily {
                days: picked.into_iter().map(|i| WEEKDAYS[i].0).collect(),
            })
        }
        2 => {
            let (day, interval) = match previous {
                Some(Recurrence::Monthly {
                    day_of_month,
                    month_interval,
                }) => (*day_of_month, *month_interval),
                _ => (1, 1),
            };
            let day_of_month = Input::<u32>::with_theme(theme)
                .with_prompt("Day of month")
                .default(day)
                .interact_text()?;
            let month_interval = Input::<u32>::with_theme(theme)
                .with_prompt("Every N months")
                .default(interval)
                .interact_text()?;
            Some(Recurrence::Monthly {
                day_of_month,
                month_interval,
            })
        }
        3 => Some(Recurrence::Yearly),
        _ => None,
    })
}

/// Collect the schedule form, reusing earlier answers as defaults.
fn fill_form(theme: &ColorfulTheme, form: &mut ScheduleForm) -> Result<()> {
    form.import_name = Input::<String>::with_theme(theme)
        .with_prompt("Import name")
        .with_initial_text(form.import_name.clone())
        .allow_empty(true)
        .interact_text()?;

    form.immediately = Confirm::with_theme(theme)
        .with_prompt("Run immediately?")
        .default(form.immediately)
        .interact()?;

    if form.immediately {
        form.start = None;
        form.stop = None;
        form.recurrence = None;
        form.indefinitely = false;
    } else {
        form.start = Some(prompt_datetime(theme, "Start", form.start)?);
        form.recurrence = prompt_recurrence(theme, form.recurrence.as_ref())?;
        if form.recurrence.is_some() {
            form.indefinitely = Confirm::with_theme(theme)
                .with_prompt("Repeat indefinitely?")
                .default(form.indefinitely)
                .interact()?;
            form.stop = if form.indefinitely {
                None
            } else {
                Some(prompt_datetime(theme, "Stop", form.stop)?)
            };
        } else {
            form.indefinitely = false;
            form.stop = None;
        }
    }

    form.email_notifications = Confirm::with_theme(theme)
        .with_prompt("Email notifications?")
        .default(form.email_notifications)
        .interact()?;
    if form.email_notifications {
        form.email = Input::<String>::with_theme(theme)
            .with_prompt("Notification email")
            .with_initial_text(form.email.clone())
            .allow_empty(true)
            .interact_text()?;
    }
    Ok(())
}

fn describe_schedule(form: &ScheduleForm) -> String {
    if form.immediately {
        return "Runs once, immediately".to_string();
    }
    let start = format_long_date(form.start);
    let mut summary = match &form.recurrence {
        None => return format!("Runs once on {}", start),
        Some(Recurrence::Daily { days }) => {
            let names: Vec<&str> = WEEKDAYS
                .iter()
                .filter(|(day, _)| days.contains(day))
                .map(|(_, label)| *label)
                .collect();
            format!("Runs every {} from {}", names.join(", "), start)
        }
        Some(Recurrence::Monthly {
            day_of_month,
            month_interval,
        }) => format!(
            "Runs on day {} every {} month(s) from {}",
            day_of_month, month_interval, start
        ),
        Some(Recurrence::Yearly) => format!("Runs every year from {}", start),
    };
    if form.indefinitely {
        summary.push_str(", indefinitely");
    } else if form.stop.is_some() {
        summary.push_str(&format!(", until {}", format_long_date(form.stop)));
    }
    summary
}

async fn schedule_step(
    theme: &ColorfulTheme,
    wizard: &mut WizardController,
    client: &ApiClient,
    form: &mut ScheduleForm,
) -> Result<Nav> {
    fill_form(theme, form)?;
    println!("{}", describe_schedule(form));

    let choice = Select::with_theme(theme)
        .with_prompt("Schedule")
        .items(&["Save", "Edit", "Back", "Cancel"])
        .default(0)
        .interact_opt()?;

    match choice {
        Some(0) => {
            let now = Local::now().naive_local();
            match wizard.submit(client, form, now).await {
                Ok(message) => println!("{}", message),
                Err(e) => eprintln!("{}", e),
            }
            Ok(Nav::Stay)
        }
        Some(1) => Ok(Nav::Stay),
        Some(2) => Ok(Nav::Back),
        _ => Ok(Nav::Cancel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn immediate_schedule_has_no_dates() {
        assert_eq!(
            describe_schedule(&ScheduleForm::immediate("Nightly")),
            "Runs once, immediately"
        );
    }

    #[test]
    fn recurring_schedule_uses_long_dates() {
        let form = ScheduleForm {
            import_name: "Nightly".into(),
            start: Some(at(5, 15)),
            stop: Some(at(31, 9)),
            recurrence: Some(Recurrence::Daily {
                days: vec![Weekday::Fri, Weekday::Mon],
            }),
            ..Default::default()
        };
        assert_eq!(
            describe_schedule(&form),
            "Runs every Monday, Friday from January 5, 2025, 3:00 PM, until January 31, 2025, 9:00 AM"
        );
    }

    #[test]
    fn yearly_indefinite_schedule() {
        let form = ScheduleForm {
            import_name: "Annual".into(),
            start: Some(at(5, 15)),
            recurrence: Some(Recurrence::Yearly),
            indefinitely: true,
            ..Default::default()
        };
        assert_eq!(
            describe_schedule(&form),
            "Runs every year from January 5, 2025, 3:00 PM, indefinitely"
        );
    }
}
