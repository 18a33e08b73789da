//! Repositories: visibility, description and both grant tables.

use std::collections::{BTreeMap, BTreeSet};

use aquayman_core::{RepositoryConfig, RepositoryRole};
use aquayman_quay::{CreateRepository, PermissionKind, Repository};

use crate::error::SyncError;
use crate::matcher::match_repository;
use crate::pipeline::Run;
use crate::report::{Action, Target};

pub(crate) fn sync_repositories(run: &mut Run<'_>) -> Result<(), SyncError> {
    let org = run.org();
    let config = run.config;

    let live = run.read(format!("repositories of {org}"), |c| c.list_repositories(org))?;
    let mut accounted: BTreeSet<&str> = BTreeSet::new();

    for repo in &live {
        let Some(rule) = match_repository(&repo.name, &config.repositories) else {
            if run.options.delete_dangling_repositories {
                let full_name = repo.full_name();
                run.apply(
                    Action::Delete,
                    Target::Repository(full_name.clone()),
                    Some("no matching rule".to_string()),
                    |c| c.delete_repository(&full_name),
                )?;
            } else {
                tracing::debug!("skipping {}: no matching rule", repo.full_name());
            }
            continue;
        };

        tracing::debug!("{} governed by rule {}", repo.full_name(), rule.name);
        sync_repository(run, repo, rule)?;
        accounted.insert(repo.name.as_str());
    }

    if !run.options.create_missing_repositories {
        return Ok(());
    }

    for rule in &config.repositories {
        if rule.is_wildcard() || accounted.contains(rule.name.as_str()) {
            continue;
        }
        let create = CreateRepository {
            namespace: org.to_string(),
            repository: rule.name.clone(),
            visibility: rule.visibility,
            description: rule.description.clone(),
        };
        run.apply(
            Action::Create,
            Target::Repository(format!("{org}/{}", rule.name)),
            Some(rule.visibility.to_string()),
            |c| c.create_repository(&create),
        )?;

        // Built locally instead of re-read, so a dry client that skipped the
        // create above still yields a plan for the grants.
        let created = Repository {
            namespace: org.to_string(),
            name: rule.name.clone(),
            is_public: rule.visibility.is_public(),
            description: rule.description.clone(),
        };
        sync_repository(run, &created, rule)?;
    }
    Ok(())
}

fn sync_repository(
    run: &mut Run<'_>,
    repo: &Repository,
    rule: &RepositoryConfig,
) -> Result<(), SyncError> {
    let full_name = repo.full_name();

    if repo.visibility() != rule.visibility {
        run.apply(
            Action::Update,
            Target::Repository(full_name.clone()),
            Some(format!("visibility {} → {}", repo.visibility(), rule.visibility)),
            |c| c.change_repository_visibility(&full_name, rule.visibility),
        )?;
    }

    if repo.description != rule.description {
        run.apply(
            Action::Update,
            Target::Repository(full_name.clone()),
            Some("description".to_string()),
            |c| c.update_repository_description(&full_name, &rule.description),
        )?;
    }

    sync_permissions(run, &full_name, PermissionKind::Team, &rule.teams)?;
    sync_permissions(run, &full_name, PermissionKind::User, &rule.users)
}

/// Revokes undeclared grantees, overwrites changed roles in place and grants
/// missing ones. Team and user grants go through the same path.
fn sync_permissions(
    run: &mut Run<'_>,
    full_name: &str,
    kind: PermissionKind,
    desired: &BTreeMap<String, RepositoryRole>,
) -> Result<(), SyncError> {
    let current = run.read(format!("{kind} permissions of {full_name}"), |c| {
        c.list_repository_permissions(full_name, kind)
    })?;

    for grant in &current {
        let target = Target::Permission {
            repo: full_name.to_string(),
            kind,
            name: grant.name.clone(),
        };
        match desired.get(&grant.name) {
            None => run.apply(Action::Delete, target, Some(grant.role.to_string()), |c| {
                c.remove_repository_permission(full_name, kind, &grant.name)
            })?,
            Some(&role) if role != grant.role => run.apply(
                Action::Update,
                target,
                Some(format!("{} → {role}", grant.role)),
                |c| c.set_repository_permission(full_name, kind, &grant.name, role),
            )?,
            Some(_) => {}
        }
    }

    for (name, &role) in desired {
        if current.iter().any(|g| &g.name == name) {
            continue;
        }
        let target = Target::Permission {
            repo: full_name.to_string(),
            kind,
            name: name.clone(),
        };
        run.apply(Action::Create, target, Some(role.to_string()), |c| {
            c.set_repository_permission(full_name, kind, name, role)
        })?;
    }
    Ok(())
}
