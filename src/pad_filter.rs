use heapless::HistoryBuffer;

/// The smoothing filter for a single capacitive pad is represented here.
///
/// Raw pad readings are noisy, so each pad keeps a short sliding window of the most
/// recent samples and works with their sum. The sum is deliberately left unscaled
/// (not divided by the window length): the extra headroom makes the touch threshold
/// and centroid weights less sensitive to quantization, and nothing downstream needs
/// the true average.
///
/// The filter also holds the signed difference against its ring neighbor, computed for
/// it by the controller during each detection pass. The filter itself knows nothing
/// about ring topology.
pub struct PadFilter<const WINDOW: usize> {
    /// The sliding window of raw readings
    buff: HistoryBuffer<u16, WINDOW>,

    /// Cached sum of everything currently in the window
    running_sum: u32,

    /// `neighbor − self`, set by the controller during the peak scan
    delta: i32,

    /// Diagnostic marker: this pad was a raw peak in the most recent detection pass
    peaked: bool,
}

impl<const WINDOW: usize> PadFilter<WINDOW> {
    /// `PadFilter::new()` is a new pad filter with a zeroed history.
    pub fn new() -> Self {
        Self {
            buff: HistoryBuffer::new(),
            running_sum: 0,
            delta: 0,
            peaked: false,
        }
    }

    /// `pad.set_reading(raw)` pushes one raw sample into the window, dropping the oldest.
    ///
    /// Must be called once per tick by whoever samples the sensor hardware.
    pub fn set_reading(&mut self, raw: u16) {
        self.buff.write(raw);
        self.running_sum = self.buff.oldest_ordered().map(|&v| u32::from(v)).sum();
    }

    /// `pad.current()` is the running sum of the window, the pad's filtered value.
    ///
    /// Until the window has filled this is the sum of however many samples arrived so far.
    pub fn current(&self) -> u32 {
        self.running_sum
    }

    /// `pad.set_delta(nc)` stores and returns the difference between the neighbor's
    /// filtered value `nc` and this pad's own.
    ///
    /// Called by the controller while walking the ring; the sign changes of these deltas
    /// are what locate the touch peaks.
    pub fn set_delta(&mut self, neighbor_current: u32) -> i32 {
        self.delta = neighbor_current as i32 - self.running_sum as i32;
        self.delta
    }

    /// `pad.delta()` is the most recently computed neighbor difference.
    pub fn delta(&self) -> i32 {
        self.delta
    }

    /// `pad.mark_peak()` flags this pad as a raw peak for the current detection pass.
    pub fn mark_peak(&mut self) {
        self.peaked = true;
    }

    /// `pad.clear_peak()` resets the peak marker, done at the top of every pass.
    pub fn clear_peak(&mut self) {
        self.peaked = false;
    }

    /// `pad.was_peak()` is `true` iff this pad was a raw peak in the most recent pass.
    ///
    /// Diagnostic only, nothing in the detection path reads it back.
    pub fn was_peak(&self) -> bool {
        self.peaked
    }
}

impl<const WINDOW: usize> Default for PadFilter<WINDOW> {
    fn default() -> Self {
        Self::new()
    }
}
