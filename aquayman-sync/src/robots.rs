//! Robot accounts and their published tokens.

use std::collections::BTreeSet;

use crate::error::SyncError;
use crate::pipeline::Run;
use crate::report::{Action, Change, Target};

pub(crate) fn sync_robots(run: &mut Run<'_>) -> Result<(), SyncError> {
    let org = run.org();
    let config = run.config;

    let live = run.read(format!("robots of {org}"), |c| c.list_robots(org, false))?;
    let live_names: BTreeSet<&str> = live.iter().map(|r| r.short_name()).collect();
    let expected: BTreeSet<&str> = config
        .robots
        .iter()
        .filter(|r| !r.deleted)
        .map(|r| r.name.as_str())
        .collect();

    // Existing robots are left alone: the registry cannot update a robot's
    // description.
    for robot in config.robots.iter().filter(|r| !r.deleted) {
        if live_names.contains(robot.name.as_str()) {
            continue;
        }
        run.apply(
            Action::Create,
            Target::Robot(robot.name.clone()),
            None,
            |c| c.create_robot(org, &robot.name, &robot.description),
        )?;
    }

    for robot in &live {
        let short = robot.short_name();
        if expected.contains(short) {
            continue;
        }
        run.apply(Action::Delete, Target::Robot(short.to_string()), None, |c| {
            c.delete_robot(org, short)
        })?;

        if run.options.publisher.is_none() {
            continue;
        }
        if let Some(record) = config.robot(short) {
            if !run.is_dry() {
                run.publish("delete", short, |p| p.delete_robot(record))?;
            }
            if record.vault_secret.is_some() {
                run.record(Change {
                    phase: run.phase,
                    action: Action::Delete,
                    target: Target::Secret(short.to_string()),
                    detail: None,
                });
            }
        }
    }

    if run.options.publisher.is_some() {
        publish_tokens(run)?;
    }
    Ok(())
}

/// Pushes the live token of every declared robot, on every run, so a changed
/// secret address takes effect without recreating the robot.
fn publish_tokens(run: &mut Run<'_>) -> Result<(), SyncError> {
    let org = run.org();
    let config = run.config;

    tracing::info!("{}publishing robot tokens", run.prefix());
    let live = run.read(format!("robot tokens of {org}"), |c| c.list_robots(org, true))?;
    for robot in &live {
        let short = robot.short_name();
        let Some(record) = config.robot(short).filter(|r| !r.deleted) else {
            continue;
        };
        if run.is_dry() {
            if record.vault_secret.is_some() {
                tracing::debug!("[dry-run] would publish token of robot {short}");
            }
            continue;
        }
        run.publish("publish", short, |p| p.update_robot(record, &robot.token))?;
    }
    Ok(())
}
