#[test]
#[ignore = "needs a MongoDB server on localhost:27017"]
fn test_roundtrip_flood_run() {
    use flood_core::{CellSize, ConnectedFloodEngine, DiamondSquare, FloodStats, GeoTransform};
    use flood_storage::FloodRunStore;
    use flood_storage::models::{FloodParams, FloodRunDoc};
    use tokio::runtime::Builder;

    // The store is async; drive it from a plain test on one thread
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime");

    rt.block_on(async {
        // Flood a small synthetic coast
        let size = 65;
        let grid = DiamondSquare::new(size, 42, 0.6)
            .unwrap()
            .generate(-2.0, 10.0)
            .unwrap();
        let mask = ConnectedFloodEngine::default()
            .flood_mask(&grid, 1.0)
            .unwrap();
        let transform = GeoTransform {
            origin_x: 0.0,
            origin_y: 650.0,
            pixel_width: 10.0,
            pixel_height: 10.0,
        };
        let stats = FloodStats::compute(&grid, &mask, 1.0, Some(CellSize::new(10.0, 10.0))).unwrap();

        // Pack mask and stats into a stored run
        let params = FloodParams {
            threshold: 1.0,
            water_level: None,
            connectivity: "four".to_string(),
        };
        let doc = FloodRunDoc::from_outcome("roundtrip", params, &mask, &stats, Some(transform))
            .unwrap();

        let store = FloodRunStore::init("mongodb://localhost:27017", "flood_db", "flood_runs")
            .await
            .expect("storage init failed");

        // The mask must come back cell for cell
        store.create(doc).await.expect("create failed");
        let found = store
            .read_by_name("roundtrip")
            .await
            .expect("read failed")
            .expect("doc not found");

        assert_eq!(found.mask.len(), size * size);
        assert_eq!(found.mask_grid().unwrap(), mask);
        assert_eq!(found.flooded_cells as usize, stats.flooded_cells);
        assert_eq!(found.transform, Some(transform));

        store.delete_by_name("roundtrip").await.expect("delete failed");
    });
}
