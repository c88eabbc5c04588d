use looproute::constants::DEFAULT_OVERPASS_URL;
use looproute::models::Coordinates;
use looproute::services::overpass::OverpassClient;
use looproute::services::providers::ScenicFeatureDiscovery;

mod common;

#[tokio::test]
async fn test_overpass_scenic_features() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let client = OverpassClient::new(DEFAULT_OVERPASS_URL.to_string());

    // Belfast city centre: parks and the River Lagan nearby
    let origin = Coordinates::new(54.597, -5.930).unwrap();
    let radius_m = 1750.0;

    let result = client.query_features(&origin, radius_m).await;
    assert!(result.is_ok(), "Overpass query should succeed: {:?}", result.err());

    let features = result.unwrap();
    assert!(!features.is_empty(), "Should find scenic features in Belfast");

    for feature in &features {
        assert!(!feature.name.is_empty(), "Feature should have a name");
        let distance_m = feature.distance_km_from_origin * 1000.0;
        assert!((200.0..=radius_m).contains(&distance_m));
        assert!((0.0..360.0).contains(&feature.bearing_from_origin));
    }
}

#[tokio::test]
async fn test_overpass_unreachable_endpoint_is_non_fatal() {
    let client = OverpassClient::new("http://127.0.0.1:9/api/interpreter".to_string());
    let origin = Coordinates::new(54.597, -5.930).unwrap();

    assert!(client.query_features(&origin, 1000.0).await.is_err());

    // The discovery seam swallows the error
    let features = client.find_features(&origin, 1000.0).await.unwrap();
    assert!(features.is_empty());
}
