//! Ordered finalize phases

use std::fmt;

/// One step of the finalize pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    RemoveStaleAppMarker,
    MergeOrder,
    ApplyOverrides,
    RunDetectIfNeeded,
    InjectLegacyBuildpacks,
    InstallLifecycleBinaries,
    RestoreCache,
    RunBuild,
    InstallLauncher,
    RelocateApp,
    MigrateLayers,
    PersistManifestMetadata,
    WriteLaunchProfile,
}

impl Phase {
    /// Every phase, in the order the driver runs them
    pub const ALL: [Phase; 13] = [
        Phase::RemoveStaleAppMarker,
        Phase::MergeOrder,
        Phase::ApplyOverrides,
        Phase::RunDetectIfNeeded,
        Phase::InjectLegacyBuildpacks,
        Phase::InstallLifecycleBinaries,
        Phase::RestoreCache,
        Phase::RunBuild,
        Phase::InstallLauncher,
        Phase::RelocateApp,
        Phase::MigrateLayers,
        Phase::PersistManifestMetadata,
        Phase::WriteLaunchProfile,
    ];

    /// Step header shown in the staging log
    pub fn title(&self) -> &'static str {
        match self {
            Self::RemoveStaleAppMarker => "Removing app marker",
            Self::MergeOrder => "Merging order metadata",
            Self::ApplyOverrides => "Applying dependency overrides",
            Self::RunDetectIfNeeded => "Detecting lifecycle buildpacks",
            Self::InjectLegacyBuildpacks => "Including previous buildpacks",
            Self::InstallLifecycleBinaries => "Installing lifecycle",
            Self::RestoreCache => "Restoring layer cache",
            Self::RunBuild => "Building with lifecycle buildpacks",
            Self::InstallLauncher => "Installing launcher",
            Self::RelocateApp => "Moving app",
            Self::MigrateLayers => "Moving layers",
            Self::PersistManifestMetadata => "Storing buildpack metadata",
            Self::WriteLaunchProfile => "Writing launch profile",
        }
    }
}

/// Completes "failed to ..." in error messages
impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::RemoveStaleAppMarker => "remove stale app marker",
            Self::MergeOrder => "merge order metadata",
            Self::ApplyOverrides => "apply override.yml",
            Self::RunDetectIfNeeded => "run lifecycle detect",
            Self::InjectLegacyBuildpacks => "include previous legacy buildpacks",
            Self::InstallLifecycleBinaries => "install lifecycle",
            Self::RestoreCache => "restore layer cache",
            Self::RunBuild => "run lifecycle builder",
            Self::InstallLauncher => "install launcher",
            Self::RelocateApp => "move app",
            Self::MigrateLayers => "move lifecycle layers",
            Self::PersistManifestMetadata => "store buildpack metadata",
            Self::WriteLaunchProfile => "write launch profile",
        };
        f.write_str(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn phases_are_unique() {
        let unique: HashSet<Phase> = Phase::ALL.iter().copied().collect();
        assert_eq!(unique.len(), Phase::ALL.len());
    }

    #[test]
    fn build_is_bracketed_by_restore_and_migrate() {
        let position = |p: Phase| Phase::ALL.iter().position(|q| *q == p).unwrap();
        assert!(position(Phase::RestoreCache) < position(Phase::RunBuild));
        assert!(position(Phase::RunBuild) < position(Phase::MigrateLayers));
        assert!(position(Phase::RunDetectIfNeeded) < position(Phase::InjectLegacyBuildpacks));
        assert_eq!(Phase::ALL[0], Phase::RemoveStaleAppMarker);
        assert_eq!(Phase::ALL[12], Phase::WriteLaunchProfile);
    }
}
