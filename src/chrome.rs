use chrono::{Local, Timelike};

use crate::{
    models::{Identity, LayoutView, NotificationItem, SidebarItem},
    roles::Role,
    route_table::{ConfigError, routes_for},
};

/// greeting
///
/// Navbar salutation for the given hour of the day (0-23).
pub fn greeting(display_name: &str, hour: u32) -> String {
    let salutation = match hour {
        0..=11 => "Bonjour",
        12..=17 => "Bon après-midi",
        _ => "Bonsoir",
    };
    format!("{salutation} {display_name}")
}

/// sidebar_for
///
/// One item per route-table entry, ids being the relative route path.
pub fn sidebar_for(role: Role) -> Result<Vec<SidebarItem>, ConfigError> {
    let table = routes_for(role)?;
    Ok(table
        .entries()
        .iter()
        .map(|entry| SidebarItem {
            id: entry.path.clone(),
            name: entry.page.label().to_string(),
            route: table.absolute(entry),
            page: entry.page,
        })
        .collect())
}

/// layout_view
///
/// Builds the navbar/sidebar model for an identity whose role is known. `hour` is injected
/// so tests are independent of the wall clock; handlers pass [`local_hour`].
pub fn layout_view(
    identity: &Identity,
    role: Role,
    notifications: &[NotificationItem],
    hour: u32,
) -> Result<LayoutView, ConfigError> {
    Ok(LayoutView {
        display_name: identity.display_name.clone(),
        role,
        avatar: identity.avatar.clone(),
        greeting: greeting(&identity.display_name, hour),
        unread_count: notifications.iter().filter(|n| !n.read).count(),
        notifications: notifications.to_vec(),
        sidebar: sidebar_for(role)?,
    })
}

pub fn local_hour() -> u32 {
    Local::now().hour()
}

/// select_item
///
/// Turns a sidebar click into the path to navigate to. Unknown ids yield `None` and the
/// click is ignored.
pub fn select_item(role: Role, item_id: &str) -> Result<Option<String>, ConfigError> {
    Ok(sidebar_for(role)?
        .into_iter()
        .find(|item| item.id == item_id)
        .map(|item| item.route))
}
