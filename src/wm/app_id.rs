//! Application identity
//!
//! Picks the id the host groups a window under, first match wins:
//! configured override, the window's own app-id property, WM_CLASS,
//! WM_CLIENT_LEADER, and finally the window id itself.

use crate::config::IdentityConfig;
use crate::wm::client::Client;

pub fn resolve_application_id(identity: &IdentityConfig, client: &Client) -> String {
    if let Some(app_id) = &identity.application_id {
        return app_id.clone();
    }
    if let Some(app_id) = &client.app_id_property {
        return app_id.clone();
    }

    let prefix = &identity.prefix;
    let vm_id = &identity.vm_id;
    if let Some(class) = &client.class {
        format!("{prefix}.{vm_id}.wmclass.{class}")
    } else if let Some(leader) = client.client_leader {
        format!("{prefix}.{vm_id}.wmclientleader.{leader}")
    } else {
        format!("{prefix}.{vm_id}.xid.{}", client.id)
    }
}
