//! Folds the sweep transcript into per-combination series.

use super::measurement::{Measurement, ResultLine};
use super::runner::{Outcome, Trial};
use std::slice;

/// All measurements of one (detector, descriptor) combination, in image
/// order. The per-field series always have the same length.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SeriesBundle {
    total: Vec<usize>,
    vehicle: Vec<usize>,
    matches: Vec<usize>,
    detector_time: Vec<f64>,
    descriptor_time: Vec<f64>,
    images: Vec<Measurement>,
}

impl SeriesBundle {
    /// Appends the next image.
    pub fn push(&mut self, m: Measurement) {
        self.total.push(m.total);
        self.vehicle.push(m.vehicle);
        self.matches.push(m.matches);
        self.detector_time.push(m.detector_time.value());
        self.descriptor_time.push(m.descriptor_time.value());
        self.images.push(m);
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image has been recorded.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Keypoints per image.
    pub fn total(&self) -> &[usize] {
        &self.total
    }

    /// Keypoints on the vehicle per image.
    pub fn vehicle(&self) -> &[usize] {
        &self.vehicle
    }

    /// Matches per image.
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    /// Detector time per image (ms).
    pub fn detector_time(&self) -> &[f64] {
        &self.detector_time
    }

    /// Descriptor time per image (ms).
    pub fn descriptor_time(&self) -> &[f64] {
        &self.descriptor_time
    }

    /// The full record per image.
    pub fn images(&self) -> &[Measurement] {
        &self.images
    }
}

/// Values keyed by name, iterated in the order the names first appeared.
/// Sweeps touch a few dozen names, so lookups scan.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for NamedMap<V> {
    fn default() -> Self {
        NamedMap { entries: Vec::new() }
    }
}

impl<V> NamedMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        NamedMap::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == name)
    }

    /// Looks up a name.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.position(name).map(|i| &self.entries[i].1)
    }

    /// The value under `name`, created with `f` (at the end of the order) if
    /// the name is new.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, name: &str, f: F) -> &mut V {
        let i = match self.position(name) {
            Some(i) => i,
            None => {
                self.entries.push((name.to_string(), f()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// Sets the value under `name`, keeping its place if it already exists.
    /// Returns the previous value.
    pub fn insert(&mut self, name: String, value: V) -> Option<V> {
        match self.position(&name) {
            Some(i) => Some(::std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Names in order.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item = &'a String> + 'a {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Values in order.
    pub fn values<'a>(&'a self) -> impl Iterator<Item = &'a V> + 'a {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Name/value pairs in order.
    pub fn iter(&self) -> Iter<V> {
        Iter { inner: self.entries.iter() }
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Iterator over the entries of a [NamedMap](struct.NamedMap.html).
pub struct Iter<'a, V: 'a> {
    inner: slice::Iter<'a, (String, V)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a String, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

impl<'a, V> IntoIterator for &'a NamedMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

/// Descriptor name to series, for one detector.
pub type DescriptorTable = NamedMap<SeriesBundle>;

/// Detector name to descriptor name to series, both levels in the order the
/// sweep first produced them. Only combinations with at least one
/// measurement have an entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AggregateTable {
    detectors: NamedMap<DescriptorTable>,
}

impl AggregateTable {
    /// Builds the table from transcript lines (result lines and
    /// invalid-combination sentinels). Malformed lines are logged and skipped.
    pub fn from_lines<I, S>(lines: I) -> AggregateTable
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut discarded = 0;
        let mut rejected = 0;

        let table = lines.into_iter().fold(AggregateTable::default(), |mut table, line| {
            match line.as_ref().parse::<ResultLine>() {
                Ok(ResultLine::Measurement(m)) => table.add(m),
                Ok(ResultLine::Invalid { detector, descriptor }) => {
                    info!(
                        "Detector {} and descriptor {} form an invalid combination. Discarding results",
                        detector,
                        descriptor
                    );
                    discarded += 1;
                }
                Err(e) => {
                    warn!("skipping line: {}", e);
                    rejected += 1;
                }
            }
            table
        });

        info!(
            "aggregated {} combinations ({} invalid, {} malformed lines)",
            table.len(),
            discarded,
            rejected
        );
        table
    }

    /// Builds the table from finished trials.
    pub fn from_trials(trials: &[Trial]) -> AggregateTable {
        for trial in trials {
            if let Outcome::SpawnFailed(ref reason) = trial.outcome {
                debug!("{}/{} never ran: {}", trial.detector, trial.descriptor, reason);
            }
        }
        AggregateTable::from_lines(trials.iter().flat_map(|t| t.lines()))
    }

    /// Appends a measurement to its combination, creating it on first touch.
    pub fn add(&mut self, m: Measurement) {
        trace!("adding {:?}", m);
        self.detectors
            .get_or_insert_with(&m.detector, NamedMap::new)
            .get_or_insert_with(&m.descriptor, SeriesBundle::default)
            .push(m);
    }

    /// Looks up one combination.
    pub fn get(&self, detector: &str, descriptor: &str) -> Option<&SeriesBundle> {
        self.detectors.get(detector).and_then(|d| d.get(descriptor))
    }

    /// Descriptors recorded for a detector.
    pub fn descriptors(&self, detector: &str) -> Option<&DescriptorTable> {
        self.detectors.get(detector)
    }

    /// Iterates detectors in order of first appearance.
    pub fn iter(&self) -> Iter<DescriptorTable> {
        self.detectors.iter()
    }

    /// Number of (detector, descriptor) combinations.
    pub fn len(&self) -> usize {
        self.detectors.values().map(|d| d.len()).sum()
    }

    /// Whether no measurement was recorded.
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::tests::FakeBenchmark;
    use crate::runner::Runner;

    fn line(det: &str, desc: &str, total: usize, matches: usize, time: f64) -> String {
        format!(
            "Detector:{}|Descriptor:{}|Matcher:MAT_BF|Total:{}|Vehicle:{}|Matches:{}|\
             DetectorTime:{}|DescriptorTime:{}",
            det,
            desc,
            total,
            total / 10,
            matches,
            time,
            time / 2.0
        )
    }

    fn assert_consistent(table: &AggregateTable) {
        for (_, descriptors) in table.iter() {
            for (_, b) in descriptors {
                let n = b.len();
                assert!(n > 0);
                assert_eq!(b.total().len(), n);
                assert_eq!(b.vehicle().len(), n);
                assert_eq!(b.matches().len(), n);
                assert_eq!(b.detector_time().len(), n);
                assert_eq!(b.descriptor_time().len(), n);
            }
        }
    }

    #[test]
    fn groups_by_detector_then_descriptor() {
        let lines = vec![
            line("FAST", "BRISK", 100, 0, 1.0),
            line("FAST", "ORB", 100, 0, 1.0),
            line("FAST", "BRISK", 110, 80, 2.0),
            line("SIFT", "SIFT", 1400, 0, 90.0),
        ];
        let table = AggregateTable::from_lines(&lines);

        assert_eq!(table.len(), 3);
        assert_eq!(table.descriptors("FAST").unwrap().len(), 2);
        let b = table.get("FAST", "BRISK").unwrap();
        assert_eq!(b.total(), &[100, 110]);
        assert_eq!(b.matches(), &[0, 80]);
        assert_eq!(b.detector_time(), &[1.0, 2.0]);
        assert_eq!(b.images()[1].total, 110);
        assert_consistent(&table);
    }

    #[test]
    fn order_follows_first_appearance() {
        let lines = vec![
            line("SHITOMASI", "BRISK", 100, 0, 1.0),
            line("SHITOMASI", "BRIEF", 100, 0, 1.0),
            line("HARRIS", "BRISK", 100, 0, 1.0),
            line("SHITOMASI", "BRISK", 120, 70, 1.0),
        ];
        let table = AggregateTable::from_lines(&lines);

        let detectors = table.iter().map(|(d, _)| d.as_str()).collect::<Vec<_>>();
        assert_eq!(detectors, vec!["SHITOMASI", "HARRIS"]);
        let descriptors = table
            .descriptors("SHITOMASI")
            .unwrap()
            .keys()
            .map(|d| d.as_str())
            .collect::<Vec<_>>();
        assert_eq!(descriptors, vec!["BRISK", "BRIEF"]);
        assert_eq!(table.get("SHITOMASI", "BRISK").unwrap().total(), &[100, 120]);
    }

    #[test]
    fn named_map_keeps_place_on_replace() {
        let mut map = NamedMap::new();
        assert_eq!(map.insert("ORB".to_string(), 1), None);
        assert_eq!(map.insert("AKAZE".to_string(), 2), None);
        assert_eq!(map.insert("ORB".to_string(), 3), Some(1));
        *map.get_or_insert_with("BRISK", || 0) += 4;
        *map.get_or_insert_with("AKAZE", || 0) += 4;

        let entries = map.iter().map(|(k, &v)| (k.as_str(), v)).collect::<Vec<_>>();
        assert_eq!(entries, vec![("ORB", 3), ("AKAZE", 6), ("BRISK", 4)]);
        assert_eq!(map.get("NONE"), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn sentinel_never_creates_entries() {
        let lines = vec![
            "Invalid combination|AKAZE|BRIEF".to_string(),
            line("FAST", "BRISK", 100, 0, 1.0),
        ];
        let table = AggregateTable::from_lines(&lines);
        assert!(table.descriptors("AKAZE").is_none());
        assert!(table.get("AKAZE", "BRIEF").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn malformed_lines_keep_series_aligned() {
        let lines = vec![
            line("ORB", "ORB", 500, 0, 5.0),
            "Detector:ORB|Descriptor:ORB|Matcher:MAT_BF|Total:500".to_string(),
            line("ORB", "ORB", 500, 0, 5.0).replace("Matches:0", "Matches:x"),
            line("ORB", "ORB", 510, 400, 6.0),
        ];
        let table = AggregateTable::from_lines(&lines);
        let b = table.get("ORB", "ORB").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.total(), &[500, 510]);
        assert_consistent(&table);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = AggregateTable::from_lines(Vec::<String>::new());
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn fake_transcript_end_to_end() {
        let mut fake = FakeBenchmark::default();
        fake.succeed(
            "FAST",
            "BRISK",
            "Detector:FAST|Descriptor:BRISK|Matcher:BF|Total:100|Vehicle:10|Matches:8|DetectorTime:1.5|DescriptorTime:0.7\n\
             Detector:FAST|Descriptor:BRISK|Matcher:BF|Total:110|Vehicle:10|Matches:8|DetectorTime:1.5|DescriptorTime:0.7\n",
        );
        fake.fail("FAST", "SIFT");
        let trials = Runner::new(fake).sweep(&[("FAST", "BRISK"), ("FAST", "SIFT"), ("SIFT", "ORB")]);
        let table = AggregateTable::from_trials(&trials);

        assert_eq!(table.len(), 1);
        let b = table.get("FAST", "BRISK").unwrap();
        assert_eq!(b.total(), &[100, 110]);
        assert_eq!(b.vehicle(), &[10, 10]);
        assert_eq!(b.matches(), &[8, 8]);
        assert_eq!(b.detector_time(), &[1.5, 1.5]);
        assert_eq!(b.descriptor_time(), &[0.7, 0.7]);
        assert!(table.get("FAST", "SIFT").is_none());
        assert!(table.descriptors("SIFT").is_none());

        let mut csv = Vec::new();
        crate::report::write_csv(&table, &mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        let rows = csv.lines().collect::<Vec<_>>();
        assert_eq!(rows.len(), 1 + 2 + 1);
        assert!(rows[1].starts_with("FAST,BRISK,0,100"));
        assert!(rows[2].starts_with("FAST,BRISK,1,110"));
        assert!(rows[3].trim_matches('"').is_empty());
    }
}
