//! End-to-end flow: load a catalog, draw and name constellations, persist to
//! disk, reopen, and render the result.

use approx::assert_relative_eq;
use nalgebra::Vector3;

use skyview::annotations::{AnnotationStore, RestoreStatus};
use skyview::arc::ArcBuilder;
use skyview::catalog::{CatalogSlot, LoadOutcome};
use skyview::celestial::{equatorial_to_sphere, DiskProjection, NotVisible};
use skyview::overlay::{constellation_arcs, group_anchors, pick_link};
use skyview::picking::{find_closest_point, project_stars, PickThreshold};
use skyview::screen::{ScreenPoint, SkyCamera, Viewport};
use skyview::storage::{keys, FileStore, KeyValueStore};
use skyview::view::{SelectionEvent, ViewState};

const CATALOG: &str = "\
id,name,proper,newra,newdec,newmag,spectral_type,con
1,HIP 100,Alpha,0,0,1.0,B2V,Ori
2,HIP 200,Beta,90,0,2.0,G2V,Ori
3,HIP 300,Gamma,45,60,3.0,M1III,Cas
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load_catalog(dir: &std::path::Path) -> CatalogSlot {
    let path = dir.join("stars.csv");
    std::fs::write(&path, CATALOG).unwrap();
    let mut slot = CatalogSlot::new();
    assert_eq!(slot.load_path(&path), LoadOutcome::Applied { stars: 3 });
    slot
}

#[test]
fn test_draw_name_persist_and_reopen() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let slot = load_catalog(dir.path());
    let catalog = slot.catalog();
    let mut storage = FileStore::with_path(dir.path().join("state"));

    // Two clicks create one link
    let mut view = ViewState::default();
    let mut store = AnnotationStore::new();
    assert_eq!(view.stars.pick(0), SelectionEvent::Armed(0));
    let SelectionEvent::Completed(a, b) = view.stars.pick(1) else {
        panic!("second pick should complete the pair");
    };
    let first = store.add_link(a, b, catalog.len()).unwrap();
    let second = store.add_link(1, 2, catalog.len()).unwrap();
    store.name_links(&[first, second], "Orion").unwrap();
    store.persist(&mut storage).unwrap();

    // Reopen from disk
    let restored = AnnotationStore::restore(&storage);
    assert_eq!(restored.links, RestoreStatus::Loaded);
    assert_eq!(restored.names, RestoreStatus::Loaded);
    let mut reopened = restored.store;
    assert_eq!(reopened.links(), store.links());
    assert_eq!(reopened.list_named_groups()["Orion"], vec![first, second]);

    // Arcs: 101 samples with exact endpoints
    let arcs = constellation_arcs(&reopened, &catalog, 1000.0, &ArcBuilder::default());
    assert_eq!(arcs.len(), 2);
    assert_eq!(arcs[0].points.len(), 101);
    assert_eq!(arcs[0].points[0], equatorial_to_sphere(0.0, 0.0, 1000.0));
    assert_eq!(arcs[0].points[100], equatorial_to_sphere(90.0, 0.0, 1000.0));
    for p in &arcs[0].points {
        assert_relative_eq!(p.norm(), 1000.0, epsilon = 1e-9);
    }
    assert!(group_anchors(&arcs).contains_key("Orion"));

    // Removing the first link keeps the second one named
    reopened.remove_link(first).unwrap();
    reopened.persist(&mut storage).unwrap();
    let again = AnnotationStore::restore(&storage).store;
    assert_eq!(again.len(), 1);
    assert_eq!(again.name_of(second), Some("Orion"));
    assert!(again.name_of(first).is_none());
}

#[test]
fn test_pick_star_and_link_from_camera() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let catalog = load_catalog(dir.path()).catalog();

    let mut store = AnnotationStore::new();
    let id = store.add_link(0, 1, catalog.len()).unwrap();
    let arcs = constellation_arcs(&store, &catalog, 1000.0, &ArcBuilder::default());

    let mut camera = SkyCamera::new(120.0, 1.0);
    camera.position = Vector3::zeros();
    camera.look_at_equatorial(0.0, 0.0);
    let viewport = Viewport::new(800.0, 800.0);
    let threshold = PickThreshold::default();

    let candidates = project_stars(&catalog, &camera, &viewport, 1000.0);
    let click = ScreenPoint::new(403.0, 398.0);
    let hit = threshold
        .filter_point(find_closest_point(&click, &candidates, 6.0))
        .unwrap();
    assert_eq!(hit.index, 0);

    // The link starts at the star under the cursor
    assert_eq!(pick_link(&arcs, &camera, &viewport, &click, &threshold), Some(id));

    let far = ScreenPoint::new(10.0, 10.0);
    assert!(threshold
        .filter_point(find_closest_point(&far, &candidates, 6.0))
        .is_none());
}

#[test]
fn test_disk_view_from_catalog() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let catalog = load_catalog(dir.path()).catalog();

    // Observer on the equator with RA 0 on the meridian
    let projection = DiskProjection::new(0.0, 0.0);
    let alpha = catalog.get(0).unwrap();
    let zenith = projection
        .project(alpha.ra_deg, alpha.dec_deg, alpha.apparent_magnitude)
        .unwrap();
    assert_relative_eq!(zenith.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(zenith.y, 0.0, epsilon = 1e-9);

    // Beta is on the horizon, under the 2 degree threshold
    let beta = catalog.get(1).unwrap();
    assert_eq!(
        projection.project(beta.ra_deg, beta.dec_deg, beta.apparent_magnitude),
        Err(NotVisible::BelowHorizon)
    );
}

#[test]
fn test_corrupt_state_on_disk_starts_empty() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStore::with_path(dir.path().to_path_buf());
    storage.set(keys::OWN_CONSTELLATION, "{not json").unwrap();

    let restored = AnnotationStore::restore(&storage);
    assert!(restored.store.is_empty());
    assert!(restored.links.is_malformed());
    assert_eq!(restored.names, RestoreStatus::Missing);
}
