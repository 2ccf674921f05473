// Tests for the synchronization engine: convergence, idempotence and failures

use fastdl::sync::compression::{decompress, CompressionType};
use fastdl::sync::{goldsrc_folders, ExclusionSet, FolderOutcome, FolderSpec, RunCounters, SyncEngine};
use fastdl::{FastDlError, RootRole};
use std::fs;

use super::common::{maps, Fixture};

#[test]
fn test_second_run_is_idempotent() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    fx.write_source("maps/de_aztec.bsp", b"aztec");
    fx.write_source("maps/cs_office/cs_office.txt", b"office");
    let folders = [maps()];

    let first = fx.run(fx.options(), &folders, None);
    assert_eq!(first.counters(), RunCounters::new(3, 0, 0));

    let second = fx.run(fx.options(), &folders, None);
    assert!(second.counters().is_zero());

    let mut full = fx.options();
    full.full_check = true;
    let third = fx.run(full, &folders, None);
    assert!(third.counters().is_zero());
}

#[test]
fn test_only_eligible_extensions_are_published() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    fx.write_source("maps/de_dust.res", b"res");
    fx.write_source("maps/readme.md", b"notes");
    fx.write_source("maps/DE_NUKE.BSP", b"upper");

    let report = fx.run(fx.options(), &[maps()], None);

    assert_eq!(report.counters().added, 1);
    assert_eq!(fx.mirror_files(), vec!["maps/de_dust.bsp.gz"]);
}

#[test]
fn test_convergence_after_source_changes() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    fx.write_source("maps/de_train.bsp", b"train");
    fx.write_source("models/player/gign/gign.mdl", b"gign");
    let folders = [maps(), FolderSpec::new("models", [".mdl"])];
    fx.run(fx.options(), &folders, None);

    fs::remove_file(fx.source.join("maps/de_train.bsp")).unwrap();
    fx.write_source("maps/de_inferno.bsp", b"inferno");

    let report = fx.run(fx.options(), &folders, None);

    assert_eq!(report.counters(), RunCounters::new(1, 0, 1));
    assert_eq!(
        fx.mirror_files(),
        vec![
            "maps/de_dust.bsp.gz",
            "maps/de_inferno.bsp.gz",
            "models/player/gign/gign.mdl.gz",
        ]
    );
}

#[test]
fn test_excluded_files_are_never_published() {
    let fx = Fixture::new();
    fx.write_source("models/barney.mdl", b"default model");
    fx.write_source("models/player/vip/vip.mdl", b"vip");
    fx.write_source("models/custom/barney.mdl", b"also excluded by name");
    let exclusions = ExclusionSet::parse("# default models\nbarney.mdl\n");

    let report = fx.run(fx.options(), &[FolderSpec::new("models", [".mdl"])], Some(&exclusions));

    assert_eq!(report.counters().added, 1);
    assert_eq!(fx.mirror_files(), vec!["models/player/vip/vip.mdl.gz"]);
    assert!(!fx.mirror_path("models/custom").exists());
}

#[test]
fn test_excluded_name_elsewhere_in_mirror_is_pruned() {
    let fx = Fixture::new();
    fx.write_source("models/barney.mdl", b"default model");
    // Same name under another path, with no source counterpart.
    fx.write_mirror("models/custom/barney.mdl.gz", b"left over");
    let exclusions = ExclusionSet::parse("barney.mdl\n");

    let report = fx.run(fx.options(), &[FolderSpec::new("models", [".mdl"])], Some(&exclusions));

    assert_eq!(report.counters(), RunCounters::new(0, 0, 1));
    assert!(!fx.mirror_path("models/barney.mdl.gz").exists());
    assert!(fx.mirror_files().is_empty());
    assert!(!fx.mirror_path("models").exists());
}

#[test]
fn test_stale_check_ignores_filters() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    // Placed out of band: no source counterpart, not an eligible extension.
    fx.write_mirror("maps/motd.html", b"<html>");
    // Has a source counterpart, so it stays even though it is not eligible.
    fx.write_source("maps/de_dust.ztmp", b"tmp");
    fx.write_mirror("maps/de_dust.ztmp", b"tmp");

    let report = fx.run(fx.options(), &[maps()], None);

    assert_eq!(report.counters(), RunCounters::new(1, 0, 1));
    assert_eq!(fx.mirror_files(), vec!["maps/de_dust.bsp.gz", "maps/de_dust.ztmp"]);
}

#[test]
fn test_empty_directories_are_reclaimed() {
    let fx = Fixture::new();
    fx.write_source("sound/ambience/wind.wav", b"wind");
    fx.write_source("sound/weapons/deep/ak47.wav", b"ak47");
    fx.write_source("sound/radio/go.wav", b"go");
    let folders = [FolderSpec::new("sound", [".wav"])];
    fx.run(fx.options(), &folders, None);
    assert_eq!(
        fx.mirror_dirs(),
        vec!["sound", "sound/ambience", "sound/radio", "sound/weapons", "sound/weapons/deep"]
    );

    fs::remove_dir_all(fx.source.join("sound")).unwrap();
    let report = fx.run(fx.options(), &folders, None);

    assert_eq!(report.counters().removed, 3);
    assert!(fx.mirror_dirs().is_empty());
    assert!(fx.mirror.is_dir());
}

#[test]
fn test_empty_directory_without_files_is_removed() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.mirror_path("maps/leftover/deeper")).unwrap();
    fx.write_source("maps/de_dust.bsp", b"dust");

    fx.run(fx.options(), &[maps()], None);

    assert_eq!(fx.mirror_dirs(), vec!["maps"]);
}

#[test]
fn test_root_folder_covers_whole_tree() {
    let fx = Fixture::new();
    fx.write_source("halflife.wad", b"wad");
    fx.write_source("custom/decals.wad", b"decals");
    fx.write_source("maps/de_dust.bsp", b"dust");

    let report = fx.run(fx.options(), &[FolderSpec::new("", [".wad"])], None);

    assert_eq!(report.counters().added, 2);
    assert_eq!(fx.mirror_files(), vec!["custom/decals.wad.gz", "halflife.wad.gz"]);

    // Removing everything must never remove the mirror root.
    fs::remove_file(fx.source.join("halflife.wad")).unwrap();
    fs::remove_file(fx.source.join("custom/decals.wad")).unwrap();
    let report = fx.run(fx.options(), &[FolderSpec::new("", [".wad"])], None);

    assert_eq!(report.counters().removed, 2);
    assert!(fx.mirror.is_dir());
    assert!(fx.mirror_files().is_empty());
    assert!(fx.mirror_dirs().is_empty());
}

#[test]
fn test_raw_copy_mode() {
    let fx = Fixture::new();
    fx.write_source("gfx/env/desertbk.tga", b"sky");
    let mut options = fx.options();
    options.compression = CompressionType::None;

    let report = fx.run(options, &[FolderSpec::new("gfx", [".tga"])], None);

    assert_eq!(report.counters().added, 1);
    assert_eq!(fs::read(fx.mirror_path("gfx/env/desertbk.tga")).unwrap(), b"sky");
}

#[test]
fn test_raw_full_check_detects_same_size_change() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"version-1");
    let mut options = fx.options();
    options.compression = CompressionType::None;
    fx.run(options.clone(), &[maps()], None);

    fx.write_source("maps/de_dust.bsp", b"version-2");

    // Presence-only mode trusts the existing entry.
    let cheap = fx.run(options.clone(), &[maps()], None);
    assert!(cheap.counters().is_zero());
    assert_eq!(fs::read(fx.mirror_path("maps/de_dust.bsp")).unwrap(), b"version-1");

    options.full_check = true;
    let full = fx.run(options, &[maps()], None);
    assert_eq!(full.counters(), RunCounters::new(0, 1, 0));
    assert_eq!(fs::read(fx.mirror_path("maps/de_dust.bsp")).unwrap(), b"version-2");
}

#[test]
fn test_compressed_full_check_detects_change() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"old content");
    fx.run(fx.options(), &[maps()], None);

    fx.write_source("maps/de_dust.bsp", b"new content, a little longer");
    let mut options = fx.options();
    options.full_check = true;
    let report = fx.run(options, &[maps()], None);

    assert_eq!(report.counters().changed, 1);
    assert_eq!(fx.read_gz("maps/de_dust.bsp.gz"), b"new content, a little longer");
}

#[test]
fn test_zstd_mirror() {
    let fx = Fixture::new();
    fx.write_source("sprites/muzzleflash.spr", b"flash");
    let mut options = fx.options();
    options.compression = CompressionType::Zstd;

    fx.run(options.clone(), &[FolderSpec::new("sprites", [".spr"])], None);
    assert_eq!(fx.mirror_files(), vec!["sprites/muzzleflash.spr.zst"]);

    options.full_check = true;
    let report = fx.run(options, &[FolderSpec::new("sprites", [".spr"])], None);
    assert!(report.counters().is_zero());
}

#[test]
fn test_switching_codec_replaces_entries() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    fx.run(fx.options(), &[maps()], None);
    assert_eq!(fx.mirror_files(), vec!["maps/de_dust.bsp.gz"]);

    let mut options = fx.options();
    options.compression = CompressionType::Zstd;
    let report = fx.run(options.clone(), &[maps()], None);

    assert_eq!(report.counters(), RunCounters::new(1, 0, 1));
    assert_eq!(fx.mirror_files(), vec!["maps/de_dust.bsp.zst"]);

    let again = fx.run(options, &[maps()], None);
    assert!(again.counters().is_zero());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_name_is_stable() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let name = OsStr::from_bytes(b"de_caf\xe9.bsp");
    fs::create_dir_all(fx.source.join("maps")).unwrap();
    fs::write(fx.source.join("maps").join(name), b"cafe").unwrap();

    let first = fx.run(fx.options(), &[maps()], None);
    assert_eq!(first.counters(), RunCounters::new(1, 0, 0));

    let second = fx.run(fx.options(), &[maps()], None);
    assert!(second.counters().is_zero());

    let entry = fx.mirror_path("maps").join(OsStr::from_bytes(b"de_caf\xe9.bsp.gz"));
    let decoded = decompress(&fs::read(entry).unwrap(), CompressionType::Gzip).unwrap();
    assert_eq!(decoded, b"cafe");
}

#[test]
fn test_missing_roots_refuse_to_start() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    fs::remove_dir(&fx.mirror).unwrap();

    let err = SyncEngine::new(fx.options()).sync(&[maps()], None).unwrap_err();
    assert!(matches!(err, FastDlError::MissingRoot { role: RootRole::Mirror, .. }));
    assert!(!fx.mirror.exists());

    let mut options = fx.options();
    options.source_root = fx.source.join("does-not-exist");
    let err = SyncEngine::new(options).sync(&[maps()], None).unwrap_err();
    assert!(matches!(err, FastDlError::MissingRoot { role: RootRole::Source, .. }));
}

#[test]
fn test_missing_subfolder_is_not_an_error() {
    let fx = Fixture::new();
    let report = fx.run(fx.options(), &goldsrc_folders(), None);

    assert!(report.is_success());
    assert_eq!(report.folders.len(), 7);
    assert!(report.counters().is_zero());
}

#[test]
fn test_failure_aborts_remaining_folders_and_keeps_counters() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", b"dust");
    fx.write_source("gfx/a.tga", b"a");
    fx.write_source("gfx/sub/b.tga", b"b");
    fx.write_source("sound/go.wav", b"go");
    // A plain file where a mirror directory has to go.
    fx.write_mirror("gfx/sub", b"in the way");
    let folders = [
        maps(),
        FolderSpec::new("gfx", [".tga"]),
        FolderSpec::new("sound", [".wav"]),
    ];

    let report = fx.run(fx.options(), &folders, None);

    assert!(!report.is_success());
    assert_eq!(report.folders.len(), 2);
    assert!(matches!(report.folders[0].outcome, FolderOutcome::Completed));
    assert!(report.folders[1].is_failed());
    assert_eq!(report.folders[1].counters.added, 1);
    assert_eq!(report.skipped, vec!["sound".to_string()]);
    assert_eq!(report.counters().added, 2);
    assert!(matches!(report.failure(), Some(FastDlError::Io { .. })));
    assert!(!fx.mirror_path("sound").exists());
}

#[test]
fn test_bytes_written_reported() {
    let fx = Fixture::new();
    fx.write_source("maps/de_dust.bsp", &[1u8; 4096]);

    let report = fx.run(fx.options(), &[maps()], None);

    let stored = fs::metadata(fx.mirror_path("maps/de_dust.bsp.gz")).unwrap().len();
    assert_eq!(report.bytes_written(), stored);
}
