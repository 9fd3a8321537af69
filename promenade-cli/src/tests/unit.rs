//! Focused unit tests covering CLI configuration, parsing and output.

use super::helpers::{StubBackend, kremlin_museums, utf8_dir, write_utf8};
use super::*;
use crate::backend::OsrmSettings;
use crate::import::{
    ImportPoisArgs, ImportPoisConfig, ImportSummary, load_pois, run_import_pois_with,
};
use crate::route::{
    RemovePointConfig, RouteConfig, ShowConfig, parse_point, route_config_from_layers_for_test,
    run_show_with,
};
use promenade_core::{
    Category, FilterSet, PlannerError, Point, RouteId, RouteKind, RoutePlanner, RouteRequest,
    ValidationError,
};
use promenade_data::{OsrmRoadRouterConfig, routing::DEFAULT_TIMEOUT_SECS};
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
#[case("55.7521,37.6172", Point::new(55.7521, 37.6172))]
#[case(" -33.8568 , 151.2153 ", Point::new(-33.8568, 151.2153))]
fn points_parse_from_lat_lon_pairs(#[case] value: &str, #[case] expected: Point) {
    assert_eq!(parse_point(value).expect("valid point"), expected);
}

#[rstest]
#[case("55.7521")]
#[case("55.7521;37.6172")]
#[case("north,east")]
#[case("")]
fn malformed_points_are_rejected(#[case] value: &str) {
    let err = parse_point(value).expect_err("malformed point");
    match err {
        CliError::InvalidPoint { value: reported } => assert_eq!(reported, value),
        other => panic!("expected InvalidPoint, found {other:?}"),
    }
}

#[rstest]
fn route_without_kind_errors() {
    let args = RouteArgs {
        point: vec!["55.75,37.61".to_owned()],
        ..RouteArgs::default()
    };

    let err = RouteConfig::try_from(args).expect_err("missing kind should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_KIND);
            assert_eq!(env, ENV_ROUTE_KIND);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn route_config_applies_defaults() {
    let args = RouteArgs {
        kind: Some("round".to_owned()),
        point: vec!["55.7521,37.6172".to_owned()],
        radius: Some(1_500),
        ..RouteArgs::default()
    };

    let config = RouteConfig::try_from(args).expect("config should build");

    assert_eq!(config.routes_db, DEFAULT_ROUTES_DB);
    assert_eq!(config.pois_db, DEFAULT_POIS_DB);
    assert_eq!(
        config.osrm,
        OsrmSettings {
            base_url: OsrmRoadRouterConfig::default().base_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    );
    let request = config.request().expect("valid request");
    assert_eq!(request.origin.kind(), RouteKind::Round);
}

#[rstest]
fn round_route_without_radius_is_invalid() {
    let args = RouteArgs {
        kind: Some("round".to_owned()),
        point: vec!["55.7521,37.6172".to_owned()],
        ..RouteArgs::default()
    };

    let config = RouteConfig::try_from(args).expect("config should build");
    let err = config.request().expect_err("radius is required");

    assert!(matches!(
        err,
        CliError::Validation(ValidationError::MissingRadius)
    ));
}

#[rstest]
fn unknown_filters_are_invalid() {
    let args = RouteArgs {
        kind: Some("direct".to_owned()),
        point: vec!["55.7558,37.6173".to_owned(), "55.7494,37.6130".to_owned()],
        filter: vec!["museum".to_owned(), "casino".to_owned()],
        ..RouteArgs::default()
    };

    let config = RouteConfig::try_from(args).expect("config should build");
    let err = config.request().expect_err("unknown filter");

    match err {
        CliError::Validation(ValidationError::UnknownFilter { name }) => {
            assert_eq!(name, "casino");
        }
        other => panic!("expected UnknownFilter, found {other:?}"),
    }
}

#[rstest]
fn show_without_route_id_errors() {
    let err = ShowConfig::try_from(ShowArgs::default()).expect_err("missing id");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_ROUTE_ID);
            assert_eq!(env, ENV_SHOW_ROUTE_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn show_loads_through_the_planner_without_counting_a_visit() {
    let backend = StubBackend::with_pois(kremlin_museums());
    let request = RouteRequest::direct(
        Point::new(55.7558, 37.6173),
        Point::new(55.7494, 37.6130),
        FilterSet::EMPTY,
    )
    .expect("valid request");
    let planned = RoutePlanner::new(&*backend.store, &*backend.selector, &*backend.router)
        .get_route(&request)
        .expect("route should plan");

    let args = ShowArgs {
        route_id: Some(planned.id),
        ..ShowArgs::default()
    };
    let mut stdout = Vec::new();
    run_show_with(args, &backend, &mut stdout).expect("route should load");

    let shown: promenade_core::Route = serde_json::from_slice(&stdout).expect("route JSON");
    assert_eq!(shown, planned);
    assert_eq!(
        backend.store.routes().first().map(|route| route.popularity),
        Some(0)
    );
    assert_eq!(
        backend.opened(),
        vec![
            DEFAULT_ROUTES_DB.to_owned(),
            DEFAULT_POIS_DB.to_owned(),
            OsrmRoadRouterConfig::default().base_url,
        ]
    );
}

#[rstest]
fn show_reports_unknown_routes_as_planner_not_found() {
    let backend = StubBackend::default();
    let args = ShowArgs {
        route_id: Some(RouteId::new(404)),
        ..ShowArgs::default()
    };
    let mut stdout = Vec::new();

    let err = run_show_with(args, &backend, &mut stdout).expect_err("unknown route");

    match err {
        CliError::Planner(PlannerError::NotFound { route_id }) => {
            assert_eq!(route_id, RouteId::new(404));
        }
        other => panic!("expected NotFound, found {other:?}"),
    }
    assert!(stdout.is_empty());
    assert!(backend.store.is_empty());
}

#[rstest]
#[case(None, Some(3), ARG_ROUTE_ID, ENV_REMOVE_POINT_ROUTE_ID)]
#[case(Some(RouteId::new(7)), None, ARG_POI_ID, ENV_REMOVE_POINT_POI_ID)]
fn remove_point_requires_both_ids(
    #[case] route_id: Option<RouteId>,
    #[case] poi_id: Option<u64>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = RemovePointArgs {
        route_id,
        poi_id,
        ..RemovePointArgs::default()
    };

    let err = RemovePointConfig::try_from(args).expect_err("missing id should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn import_without_file_errors() {
    let err = ImportPoisConfig::try_from(ImportPoisArgs::default()).expect_err("missing file");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_POIS_FILE);
            assert_eq!(env, ENV_IMPORT_POIS_FILE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "radius": "far" }));

    let err = route_config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "kind": "round",
            "routes_db": "/srv/promenade/routes.db",
            "osrm_base_url": "http://from-file:5000",
            "osrm_timeout_secs": 30,
        }),
        None,
    );
    composer.push_environment(json!({
        "routes_db": "/var/lib/promenade/routes.db",
        "osrm_timeout_secs": 5,
    }));
    composer.push_cli(json!({
        "kind": "direct",
        "osrm_timeout_secs": 2,
    }));

    let config =
        route_config_from_layers_for_test(composer.layers()).expect("merged config should build");

    assert_eq!(config.kind, "direct");
    assert_eq!(config.routes_db, "/var/lib/promenade/routes.db");
    assert_eq!(config.pois_db, DEFAULT_POIS_DB);
    assert_eq!(config.osrm.base_url, "http://from-file:5000");
    assert_eq!(config.osrm.timeout_secs, 2);
}

#[rstest]
fn load_pois_reports_missing_files() {
    let tmp = TempDir::new().expect("tempdir");
    let path = utf8_dir(&tmp).join("missing.json");

    let err = load_pois(&path).expect_err("missing file should error");
    match err {
        CliError::OpenPoiFile { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected OpenPoiFile, found {other:?}"),
    }
}

#[rstest]
fn load_pois_reports_invalid_json() {
    let tmp = TempDir::new().expect("tempdir");
    let path = utf8_dir(&tmp).join("pois.json");
    write_utf8(&path, br#"[{ "id": 1, "category": "casino" }]"#);

    let err = load_pois(&path).expect_err("invalid POIs should error");
    assert!(matches!(err, CliError::ParsePoiFile { .. }));
}

#[rstest]
fn import_pois_seeds_the_catalogue() {
    let tmp = TempDir::new().expect("tempdir");
    let root = utf8_dir(&tmp);
    let pois_file = root.join("pois.json");
    let pois_db = root.join("data/pois.db");
    write_utf8(
        &pois_file,
        br#"[
            {"id": 1, "location": {"lat": 55.7530, "lon": 37.6150}, "category": "museum",
             "tags": {"name": "State Historical Museum"}},
            {"id": 2, "location": {"lat": 55.7510, "lon": 37.6140}, "category": "monument"}
        ]"#,
    );
    let args = ImportPoisArgs {
        pois_file: Some(pois_file),
        pois_db: Some(pois_db.clone()),
    };
    let mut stdout = Vec::new();

    run_import_pois_with(args, &mut stdout).expect("import should succeed");

    let summary: ImportSummary = serde_json::from_slice(&stdout).expect("summary JSON");
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.pois_db, pois_db);

    let catalogue =
        promenade_data::SqlitePoiCatalogue::open(pois_db.as_std_path()).expect("open catalogue");
    let bbox = geo::Rect::new(
        geo::Coord { x: 37.61, y: 55.75 },
        geo::Coord { x: 37.62, y: 55.76 },
    );
    let found = promenade_core::PathSelector::candidates_in_box(
        &catalogue,
        &bbox,
        promenade_core::FilterSet::EMPTY.with(Category::Museum),
    )
    .expect("box query");
    assert_eq!(found.len(), 1);
    assert_eq!(
        found.first().and_then(|poi| poi.name()),
        Some("State Historical Museum")
    );
}

#[cfg(feature = "store-sqlite")]
#[rstest]
fn route_command_runs_against_sqlite_files_without_a_router() {
    let tmp = TempDir::new().expect("tempdir");
    let root = utf8_dir(&tmp);
    let routes_db = root.join("routes.db");
    let pois_db = root.join("pois.db");
    promenade_data::persist_pois_to_sqlite(&pois_db, &kremlin_museums())
        .expect("seed catalogue");

    let argv = [
        "promenade",
        "route",
        "--kind",
        "direct",
        "--point",
        "55.7558,37.6173",
        "--point",
        "55.7494,37.6130",
        "--routes-db",
        routes_db.as_str(),
        "--pois-db",
        pois_db.as_str(),
        "--osrm-base-url",
        "http://127.0.0.1:9",
        "--osrm-timeout-secs",
        "2",
    ];
    let command = Cli::try_parse_from(argv).expect("arguments parse").command;
    let mut stdout = Vec::new();
    run_command(command, &backend::SqliteOsrmBackend, &mut stdout).expect("route should plan");
    let route: promenade_core::Route = serde_json::from_slice(&stdout).expect("route JSON");

    let ids: Vec<u64> = route.pois.iter().map(|poi| poi.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(route.length_m > 0.0);

    let route_id = route.id.to_string();
    let show = Cli::try_parse_from([
        "promenade",
        "show",
        route_id.as_str(),
        "--routes-db",
        routes_db.as_str(),
        "--pois-db",
        pois_db.as_str(),
    ])
    .expect("arguments parse")
    .command;
    let mut shown = Vec::new();
    run_command(show, &backend::SqliteOsrmBackend, &mut shown).expect("route should load");
    let reloaded: promenade_core::Route = serde_json::from_slice(&shown).expect("route JSON");
    assert_eq!(reloaded.id, route.id);
    assert!(reloaded.visits(1) && reloaded.visits(2));
}

#[rstest]
fn json_output_ends_with_a_newline() {
    let mut stdout = Vec::new();
    write_json(&mut stdout, &vec![Category::Park]).expect("write output");
    assert_eq!(stdout, b"[\n  \"park\"\n]\n");
}
