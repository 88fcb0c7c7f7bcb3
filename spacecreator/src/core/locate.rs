//! Lookups of the overview's "add space" control in the Dock's element tree.

use crate::macos::{describe_ax_error, role, AXError, DisplayId};
use crate::platform::UiTree;

use super::strategy::FailureReason;

pub const OVERVIEW_HOST: &str = "Dock";

mod ident {
    pub const OVERVIEW: &str = "mc";
    pub const DISPLAY: &str = "mc.display";
    pub const SPACES_BAR: &str = "mc.spaces";
    pub const ADD_BUTTON: &str = "mc.spaces.add";
}

fn unreachable(err: AXError) -> FailureReason {
    FailureReason::Unreachable {
        process: OVERVIEW_HOST.to_string(),
        detail: format!("{} ({})", describe_ax_error(err), err),
    }
}

fn lookup(path: &str) -> FailureReason {
    FailureReason::LookupFailure(path.to_string())
}

/// Children of the host root. A failure here means the process itself could
/// not be queried.
fn root_children<T: UiTree>(tree: &T, pid: i32) -> Result<Vec<T::Element>, FailureReason> {
    tree.children(&tree.application(pid)).map_err(unreachable)
}

fn has_identifier<T: UiTree>(tree: &T, element: &T::Element, identifier: &str) -> bool {
    tree.identifier(element).is_ok_and(|id| id == identifier)
}

fn has_role<T: UiTree>(tree: &T, element: &T::Element, role: &str) -> bool {
    tree.role(element).is_ok_and(|r| r == role)
}

fn child_with_identifier<T: UiTree>(
    tree: &T,
    parent: &T::Element,
    identifier: &str,
) -> Result<T::Element, FailureReason> {
    tree.children(parent)
        .map_err(|_| lookup(identifier))?
        .into_iter()
        .find(|c| has_identifier(tree, c, identifier))
        .ok_or_else(|| lookup(identifier))
}

fn first_with_role<T: UiTree>(tree: &T, elements: Vec<T::Element>, role: &str) -> Option<T::Element> {
    elements.into_iter().find(|e| has_role(tree, e, role))
}

/// Follow the labelled path `mc > mc.display > mc.spaces > mc.spaces.add`,
/// choosing the display container that belongs to `display_id`. When the
/// containers carry no display id and there is only one, that one is used.
pub fn find_labelled_add_control<T: UiTree>(
    tree: &T,
    host_pid: i32,
    display_id: DisplayId,
) -> Result<T::Element, FailureReason> {
    let overview = root_children(tree, host_pid)?
        .into_iter()
        .find(|c| has_identifier(tree, c, ident::OVERVIEW))
        .ok_or_else(|| lookup(ident::OVERVIEW))?;

    let containers: Vec<T::Element> = tree
        .children(&overview)
        .map_err(|_| lookup(ident::DISPLAY))?
        .into_iter()
        .filter(|c| has_identifier(tree, c, ident::DISPLAY))
        .collect();

    let matching = containers
        .iter()
        .find(|c| tree.display_id(c).is_ok_and(|id| id == display_id))
        .cloned();
    let container = match matching {
        Some(c) => c,
        None if containers.len() == 1 => containers[0].clone(),
        None if containers.is_empty() => return Err(lookup(ident::DISPLAY)),
        None => {
            return Err(lookup(&format!(
                "{} for display {}",
                ident::DISPLAY,
                display_id
            )))
        }
    };

    let bar = child_with_identifier(tree, &container, ident::SPACES_BAR)?;
    child_with_identifier(tree, &bar, ident::ADD_BUTTON)
}

/// Scan every group under `group 1 of group 1` and take the first button
/// found in any of them. Tolerates missing labels and reordered siblings.
pub fn scan_for_add_control<T: UiTree>(tree: &T, host_pid: i32) -> Result<T::Element, FailureReason> {
    let outer = first_with_role(tree, root_children(tree, host_pid)?, role::GROUP)
        .ok_or_else(|| lookup("group 1"))?;
    let inner = tree
        .children(&outer)
        .ok()
        .and_then(|c| first_with_role(tree, c, role::GROUP))
        .ok_or_else(|| lookup("group 1 of group 1"))?;

    let groups = tree
        .children(&inner)
        .map_err(|_| lookup("groups of group 1 of group 1"))?;
    groups
        .into_iter()
        .filter(|g| has_role(tree, g, role::GROUP))
        .find_map(|g| {
            tree.children(&g)
                .ok()
                .and_then(|c| first_with_role(tree, c, role::BUTTON))
        })
        .ok_or_else(|| lookup("button in groups of group 1 of group 1"))
}
