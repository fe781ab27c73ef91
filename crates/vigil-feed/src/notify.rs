//! Arrival notification gating.
//!
//! One permission state feeds both the toggle UI and the
//! send-notification call site, instead of scattering boolean flags
//! across listeners.

/// Desktop notification permission, modeled as a single enum consumed
/// uniformly by the toggle and by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    /// The environment cannot deliver desktop notifications.
    Unsupported,
    /// Permission was denied; toggling has no effect.
    Denied,
    /// Permission granted, notifications switched off by the user.
    #[default]
    GrantedDisabled,
    /// Permission granted and notifications switched on.
    GrantedEnabled,
}

impl NotificationPermission {
    /// True when a notification should actually be sent.
    pub fn can_send(&self) -> bool {
        matches!(self, NotificationPermission::GrantedEnabled)
    }

    /// Flip the user toggle. Only the two granted states flip;
    /// unsupported and denied are terminal.
    pub fn toggle(self) -> Self {
        match self {
            NotificationPermission::GrantedDisabled => NotificationPermission::GrantedEnabled,
            NotificationPermission::GrantedEnabled => NotificationPermission::GrantedDisabled,
            other => other,
        }
    }

    /// Short label for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationPermission::Unsupported => "n/a",
            NotificationPermission::Denied => "denied",
            NotificationPermission::GrantedDisabled => "off",
            NotificationPermission::GrantedEnabled => "on",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_granted_enabled_sends() {
        assert!(NotificationPermission::GrantedEnabled.can_send());
        assert!(!NotificationPermission::GrantedDisabled.can_send());
        assert!(!NotificationPermission::Denied.can_send());
        assert!(!NotificationPermission::Unsupported.can_send());
    }

    #[test]
    fn test_toggle_flips_granted_states() {
        assert_eq!(
            NotificationPermission::GrantedDisabled.toggle(),
            NotificationPermission::GrantedEnabled
        );
        assert_eq!(
            NotificationPermission::GrantedEnabled.toggle(),
            NotificationPermission::GrantedDisabled
        );
    }

    #[test]
    fn test_toggle_is_noop_when_not_granted() {
        assert_eq!(
            NotificationPermission::Denied.toggle(),
            NotificationPermission::Denied
        );
        assert_eq!(
            NotificationPermission::Unsupported.toggle(),
            NotificationPermission::Unsupported
        );
    }
}
