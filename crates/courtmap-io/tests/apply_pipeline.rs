use approx::assert_relative_eq;
use courtmap_geometry::{find_homography, transform_table};
use courtmap_io::{read_correspondences, read_tags, CorrespondenceColumns, OutputConfig, TrajectoryTable};

// pixel corners of a doubles court and their positions in meters
const COURT_CSV: &str = "Point,X,Y,GrX,GrY\n\
                         1,100,100,0,0\n\
                         2,300,100,10,0\n\
                         3,100,500,0,20\n\
                         4,300,500,10,20\n\
                         5,,,5,10\n";

#[test]
fn estimate_and_apply_to_wide_table() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let court_path = dir.path().join("court.csv");
    let tagged_path = dir.path().join("rally_tagged.csv");
    std::fs::write(&court_path, COURT_CSV)?;
    std::fs::write(
        &tagged_path,
        "frame,player_x,player_y,comment\n0,200,300,start\n1,,,occluded\n2,100,100,\n",
    )?;

    let correspondences = read_correspondences(&court_path, &CorrespondenceColumns::default())?;
    assert_eq!(correspondences.len(), 4);
    let h = find_homography(&correspondences)?;

    let table = TrajectoryTable::read(&tagged_path)?;
    let transformed = transform_table(&h, &table.coordinate_table()?);

    let output = OutputConfig::default();
    let out_path = output.resolve_output_path(&tagged_path);
    assert_eq!(out_path, dir.path().join("rally_tagged_homography.csv"));
    table.with_transformed(&transformed, &output.suffix).write(&out_path)?;

    let written = TrajectoryTable::read(&out_path)?;
    assert_eq!(
        written.headers(),
        ["frame", "player_x", "player_y", "comment", "player_x_meters", "player_y_meters"]
    );
    assert_eq!(written.rows()[0][3], "start");
    assert_eq!(written.rows()[1][3], "occluded");
    assert_eq!(written.rows()[1][4..], ["", ""]);

    let x0: f64 = written.rows()[0][4].parse()?;
    let y0: f64 = written.rows()[0][5].parse()?;
    assert_relative_eq!(x0, 5.0, epsilon = 1e-9);
    assert_relative_eq!(y0, 10.0, epsilon = 1e-9);

    let x2: f64 = written.rows()[2][4].parse()?;
    let y2: f64 = written.rows()[2][5].parse()?;
    assert_relative_eq!(x2, 0.0, epsilon = 1e-9);
    assert_relative_eq!(y2, 0.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn long_format_tags_feed_the_same_pipeline() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let court_path = dir.path().join("court.csv");
    let tags_path = dir.path().join("tags.csv");
    std::fs::write(&court_path, COURT_CSV)?;
    std::fs::write(
        &tags_path,
        "frame,label,x,y\n0,ball,300,500\n0,feet,200,100\n1,ball,200,300\n",
    )?;

    let h = find_homography(&read_correspondences(&court_path, &Default::default())?)?;
    let table = read_tags(&tags_path)?;
    let transformed = transform_table(&h, &table.coordinate_table()?);

    let ball = transformed.get("ball").ok_or("ball stream missing")?.valid_points();
    let p0 = ball[0].ok_or("frame 0 missing")?;
    assert_relative_eq!(p0.x, 10.0, epsilon = 1e-9);
    assert_relative_eq!(p0.y, 20.0, epsilon = 1e-9);
    let p1 = ball[1].ok_or("frame 1 missing")?;
    assert_relative_eq!(p1.x, 5.0, epsilon = 1e-9);
    assert_relative_eq!(p1.y, 10.0, epsilon = 1e-9);

    let feet = transformed.get("feet").ok_or("feet stream missing")?.valid_points();
    assert_eq!(feet.len(), 2);
    assert!(feet[1].is_none());
    Ok(())
}
