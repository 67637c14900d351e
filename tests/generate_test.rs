//! End-to-end generation against a mocked TMDB with local output.

mod common;

use common::TmdbMock;
use postergrid::devices::DeviceProfile;
use postergrid::generator::Generator;
use postergrid::report::Outcome;
use postergrid_common::{ArtifactFormat, DeviceCategory};
use serial_test::serial;

fn test_profile() -> DeviceProfile {
    DeviceProfile::new("Test", 1920, 1080, 1.0, DeviceCategory::Desktop)
}

#[tokio::test]
#[serial]
async fn full_hd_profile_writes_three_formats() {
    let mock = TmdbMock::start(20).await;
    let dir = tempfile::tempdir().unwrap();
    let config = mock.config(dir.path(), 10);

    let generator = Generator::new(&config, vec![test_profile()]).unwrap();
    let report = generator.generate_all().await;

    assert_eq!(report.fetch.posters_cached, 10);
    assert_eq!(report.succeeded(), 1);

    for (folder, file) in [
        ("original", "test.png"),
        ("jpeg", "test.jpg"),
        ("webp", "test.webp"),
    ] {
        let path = dir.path().join(folder).join(file);
        assert!(path.exists(), "{} missing", path.display());
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1920, 1080));
    }

    let jpeg_len = std::fs::metadata(dir.path().join("jpeg/test.jpg"))
        .unwrap()
        .len();
    assert!(jpeg_len <= 1000 * 1024, "JPEG is {jpeg_len} bytes");

    let artifacts = report.devices[0].outcome.success().unwrap();
    assert_eq!(artifacts.target_kb, 1000);
    assert_eq!(artifacts.webp_quality, 85);
    assert!((50..=95).contains(&artifacts.jpeg_quality));
    assert_eq!(artifacts.references.len(), 3);
    assert!(artifacts.references[&ArtifactFormat::Webp].ends_with("test.webp"));
}

#[tokio::test]
#[serial]
async fn default_output_dir_is_relative_backgrounds() {
    let mock = TmdbMock::start(10).await;
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let mut config = mock.config(dir.path(), 4);
    config.output = Default::default();
    config.output.poster_count = 4;

    let profile = DeviceProfile::new("Small Screen", 320, 200, 1.0, DeviceCategory::Mobile);
    let generator = Generator::new(&config, vec![profile]).unwrap();
    let report = generator.generate_all().await;

    std::env::set_current_dir(previous).unwrap();

    assert_eq!(report.succeeded(), 1);
    for path in [
        "backgrounds/original/small_screen.png",
        "backgrounds/jpeg/small_screen.jpg",
        "backgrounds/webp/small_screen.webp",
    ] {
        assert!(dir.path().join(path).exists(), "{path} missing");
    }
}

#[tokio::test]
#[serial]
async fn posters_are_fetched_once_for_all_devices() {
    let mock = TmdbMock::start(10).await;
    let dir = tempfile::tempdir().unwrap();
    let config = mock.config(dir.path(), 6);

    let profiles = vec![
        DeviceProfile::new("A", 200, 120, 1.0, DeviceCategory::Desktop),
        DeviceProfile::new("B", 120, 260, 1.0, DeviceCategory::Mobile),
        DeviceProfile::new("C", 160, 120, 1.5, DeviceCategory::Tablet),
    ];
    let generator = Generator::new(&config, profiles).unwrap();
    let first = generator.generate_all().await;
    let second = generator.generate_all().await;

    assert_eq!(first.succeeded(), 3);
    assert_eq!(second.succeeded(), 3);

    let requests = mock.server.received_requests().await.unwrap();
    let listings = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/popular"))
        .count();
    let posters = requests.len() - listings;
    assert_eq!(listings, 2);
    assert_eq!(posters, 6);
}

#[tokio::test]
#[serial]
async fn unreachable_catalog_skips_devices_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let mock = TmdbMock::start(1).await;
    let mut config = mock.config(dir.path(), 4);
    // Nothing listens here.
    config.tmdb.base_url = "http://127.0.0.1:9/3".to_string();

    let generator = Generator::new(&config, vec![test_profile()]).unwrap();
    let report = generator.generate_all().await;

    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.fetch.skips.len(), 6);
    assert!(matches!(report.devices[0].outcome, Outcome::Skipped(_)));
}
