use approx::assert_abs_diff_eq;
use nalgebra::Point3;

use planning::{
    annotate, load_states, Direction, Discretizer, PathState, SegmentType, TURN_ZONE, WORK_ZONE,
};
use trajectory::{Annotation, AnnotationKind, FormatKind, GeoPoint};

fn state(x: f64, y: f64, velocity: f64, dir: Direction, segment_type: SegmentType) -> PathState {
    PathState::new(Point3::new(x, y, 0.0), velocity, dir, segment_type)
}

fn annotation(kind: AnnotationKind, value: &str, point_index: usize) -> Annotation {
    Annotation {
        kind,
        value: value.to_string(),
        point_index,
    }
}

#[test]
fn swath_then_reversing_turn() {
    use Direction::*;
    use SegmentType::*;

    let states = vec![
        state(0.0, 0.0, 1.0, Forward, Swath),
        state(5.0, 0.0, 1.0, Forward, Swath),
        state(5.0, 0.0, 0.5, Forward, Turn),
        state(5.0, 3.0, 0.5, Backward, Turn),
    ];
    let resampled = Discretizer::new(2.0).discretize(&states).unwrap();
    let anchor = GeoPoint::new(46.339159, 3.433923, 279.47);
    let traj = annotate(&resampled, anchor).unwrap();

    let expected = [
        [0.0, 0.0, 1.0],
        [5.0 / 3.0, 0.0, 1.0],
        [10.0 / 3.0, 0.0, 1.0],
        // The work run ends exactly where the swath does
        [5.0, 0.0, 1.0],
        // The turn state at (5, 0) isn't repeated, but the walk towards (5, 3) is a turn
        [5.0, 1.5, 0.5],
        [5.0, 3.0, -0.5],
    ];
    assert_eq!(traj.len(), expected.len());
    for (pt, expected) in traj.points().zip(expected.iter()) {
        for (a, b) in pt.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }
    assert_eq!(resampled[3].segment_type, Swath);
    assert_eq!(resampled[4].segment_type, Turn);

    assert_eq!(traj.section_indexes(), vec![0, 5]);
    assert_eq!(
        traj.annotations(),
        &[
            annotation(AnnotationKind::ZoneEnter, WORK_ZONE, 0),
            annotation(AnnotationKind::ZoneExit, WORK_ZONE, 3),
            annotation(AnnotationKind::ZoneEnter, TURN_ZONE, 4),
            annotation(AnnotationKind::ZoneExit, WORK_ZONE, 5),
        ]
    );
    assert_eq!(traj.zones()[WORK_ZONE], vec![(0, 3)]);
    for state in &resampled {
        assert!(state.duration.is_some());
    }
    // Ending in a turn leaves "uturn" open and closes "work" twice
    assert!(traj.check_annotations().is_err());
}

#[test]
fn resampled_field_is_balanced() {
    use Direction::*;
    use SegmentType::*;

    let states = vec![
        state(0.0, 0.0, 1.5, Forward, Swath),
        state(20.0, 0.0, 1.5, Forward, Swath),
        state(23.0, 1.5, 0.5, Forward, Turn),
        state(21.0, 3.0, 0.5, Backward, Turn),
        state(20.0, 6.0, 0.5, Forward, Turn),
        state(19.5, 6.0, 1.5, Forward, Swath),
        state(0.0, 6.0, 1.5, Forward, Swath),
    ];
    let step = 0.75;
    let resampled = Discretizer::new(step).discretize(&states).unwrap();

    for pair in resampled.windows(2) {
        let d = (pair[1].position - pair[0].position).xy().norm();
        assert!(d <= step + 1e-9, "{} apart", d);
        assert!(d > 0.0);
    }

    let traj = annotate(&resampled, GeoPoint::default()).unwrap();
    for (pt, state) in traj.points().zip(&resampled) {
        assert_eq!(pt[2], state.velocity * state.direction.sign());
    }
    traj.check_annotations().unwrap();
    assert_eq!(traj.zones()[WORK_ZONE].len(), 2);
    assert_eq!(traj.zones()[TURN_ZONE].len(), 1);
    assert_eq!(traj.num_sections(), 3);

    // Everything the annotator produces can be stored and read back
    let text = FormatKind::Traj.encode(&traj).unwrap();
    let back = FormatKind::Traj.decode(&text).unwrap();
    assert_eq!(back.len(), traj.len());
    assert_eq!(back.section_indexes(), traj.section_indexes());
    assert_eq!(back.annotations(), traj.annotations());
}

#[test]
fn from_planner_csv() {
    let input = "x,y,z,velocity,dir,type,angle,duration
0,0,,1.0,1,swath,0,
4,0,,1.0,1,swath,0,
4,2,,0.5,-1,turn,1.57,
";
    let states = load_states(input.as_bytes()).unwrap();
    let resampled = Discretizer::new(1.0).discretize(&states).unwrap();
    let traj = annotate(&resampled, GeoPoint::default()).unwrap();
    assert_eq!(traj.len(), 7);
    assert_eq!(traj.section_indexes(), vec![0, 6]);
    assert_eq!(traj.point(6), &[4.0, 2.0, -0.5]);
    assert_abs_diff_eq!(traj.length(), 5.0, epsilon = 1e-9);
}
