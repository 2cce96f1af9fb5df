// Unit tests for elevation detection

use crate::scripts::privilege::{ElevationProbe, SystemElevationProbe, groups_indicate_admin};

/// **VALUE**: Verifies admin detection from `whoami /groups` output, by SID and by name.
///
/// **WHY THIS MATTERS**: Localized Windows installs print the group name translated; the SID
/// match is what keeps the check working there.
///
/// **BUG THIS CATCHES**: Would catch a pattern that only matches the English group name.
#[test]
fn given_whoami_output_with_admin_group_when_parsed_then_elevated() {
    let english = r"BUILTIN\Administrators  Alias  S-1-5-32-544  Mandatory group, Enabled";
    let localized = r"VORDEFINIERT\Administratoren  Alias  S-1-5-32-544  Gruppe";

    assert!(groups_indicate_admin(english));
    assert!(groups_indicate_admin(localized));
    assert!(groups_indicate_admin(r"builtin\administrators"));
}

#[test]
fn given_whoami_output_without_admin_group_when_parsed_then_not_elevated() {
    let output = r"BUILTIN\Users  Alias  S-1-5-32-545  Mandatory group, Enabled";

    assert!(!groups_indicate_admin(output));
    assert!(!groups_indicate_admin(""));
}

/// **VALUE**: Verifies the system probe agrees with the effective uid on POSIX hosts.
///
/// **WHY THIS MATTERS**: This is the check that keeps root from running user scripts.
///
/// **BUG THIS CATCHES**: Would catch the probe reading the real uid or always returning false.
#[cfg(unix)]
#[test]
fn given_unix_host_when_probing_then_matches_effective_uid() {
    let expected = unsafe { libc::geteuid() } == 0;

    assert_eq!(SystemElevationProbe.is_elevated(), expected);
}
