//! Upload controller: owns the loaded document and drives a [`Surface`].
//!
//! Reading file text is the only suspension point, so an upload is split in two:
//! [`Session::begin_upload`] runs when the user picks or drops files, and
//! [`Session::finish_upload`] runs when the read completes. Reads are not
//! cancelled; whichever completes last replaces the session state.

use tracing::{debug, info, warn};

use crate::{
    chart_for_section, derive, extract_color_encoding, validate, ChartDescription, ColorEncoding,
    DerivedStats, PcaError, ResultDocument, SectionId, SectionTransition, SectionVisibility,
    StatCard, ViewerConfig,
};

/// The presentation layer as seen by the session.
pub trait Surface {
    /// Blocking user notification.
    fn alert(&mut self, message: &str);
    fn set_loading(&mut self, loading: bool);
    fn set_results_visible(&mut self, visible: bool);
    fn set_file_name(&mut self, name: &str);
    fn set_stats(&mut self, cards: &[StatCard]);
    fn set_section_visible(&mut self, section: SectionId, visible: bool);
    fn plot(&mut self, section: SectionId, chart: &ChartDescription);
}

/// Handle for one accepted file whose text is still being read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    pub seq: u64,
    pub file_name: String,
}

#[derive(Clone, Debug)]
struct Loaded {
    file_name: String,
    document: ResultDocument,
    stats: DerivedStats,
    encoding: ColorEncoding,
}

#[derive(Clone, Debug)]
pub struct Session {
    config: ViewerConfig,
    sections: SectionVisibility,
    loaded: Option<Loaded>,
    next_seq: u64,
    pending_reads: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Session {
    pub fn new(config: ViewerConfig) -> Self {
        let sections = SectionVisibility::new(&config.default_sections);
        Self {
            config,
            sections,
            loaded: None,
            next_seq: 0,
            pending_reads: 0,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn sections(&self) -> &SectionVisibility {
        &self.sections
    }

    pub fn document(&self) -> Option<&ResultDocument> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    pub fn stats(&self) -> Option<&DerivedStats> {
        self.loaded.as_ref().map(|l| &l.stats)
    }

    pub fn color_encoding(&self) -> Option<&ColorEncoding> {
        self.loaded.as_ref().map(|l| &l.encoding)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.file_name.as_str())
    }

    pub fn is_loading(&self) -> bool {
        self.pending_reads > 0
    }

    /// Accept the first of `file_names`; the rest are ignored.
    pub fn begin_upload<S: Surface + ?Sized>(
        &mut self,
        file_names: &[&str],
        surface: &mut S,
    ) -> Result<UploadTicket, PcaError> {
        let Some(name) = file_names.first() else {
            return Err(PcaError::NoFileSelected);
        };
        if file_names.len() > 1 {
            debug!(ignored = file_names.len() - 1, "only the first file is processed");
        }
        if !self.config.extension_match.accepts(name) {
            let err = PcaError::UnsupportedFileType(name.to_string());
            warn!("{err}");
            surface.alert("Please upload a valid '.json' file.");
            return Err(err);
        }

        self.next_seq += 1;
        self.pending_reads += 1;
        surface.set_file_name(name);
        surface.set_loading(true);
        surface.set_results_visible(false);
        debug!(seq = self.next_seq, file = %name, "reading file");
        Ok(UploadTicket {
            seq: self.next_seq,
            file_name: name.to_string(),
        })
    }

    /// Complete an upload with the text the host read (or the read failure).
    pub fn finish_upload<S: Surface + ?Sized>(
        &mut self,
        ticket: UploadTicket,
        text: Result<String, PcaError>,
        surface: &mut S,
    ) -> Result<(), PcaError> {
        self.pending_reads = self.pending_reads.saturating_sub(1);
        if self.pending_reads == 0 {
            surface.set_loading(false);
        }

        match text.and_then(|raw| Self::load(&ticket.file_name, &raw)) {
            Ok(loaded) => {
                info!(
                    file = %ticket.file_name,
                    points = loaded.stats.point_count,
                    components = loaded.document.component_count(),
                    "result file loaded"
                );
                self.loaded = Some(loaded);
                self.display_results(surface);
                Ok(())
            }
            Err(err) => {
                warn!(file = %ticket.file_name, "upload rejected: {err}");
                surface.alert(&format!("Error processing file: {err}"));
                if let Some(loaded) = self.loaded.as_ref() {
                    surface.set_file_name(&loaded.file_name);
                    if self.pending_reads == 0 {
                        surface.set_results_visible(true);
                    }
                }
                Err(err)
            }
        }
    }

    /// Synchronous upload for hosts that can read the file inline.
    pub fn handle_upload<S, F>(&mut self, file_name: &str, read: F, surface: &mut S) -> Result<(), PcaError>
    where
        S: Surface + ?Sized,
        F: FnOnce() -> Result<String, PcaError>,
    {
        let ticket = self.begin_upload(&[file_name], surface)?;
        let text = read();
        self.finish_upload(ticket, text, surface)
    }

    fn load(file_name: &str, raw: &str) -> Result<Loaded, PcaError> {
        let document = validate(raw)?;
        let stats = derive(&document)?;
        let encoding = extract_color_encoding(&document.points);
        Ok(Loaded {
            file_name: file_name.to_string(),
            document,
            stats,
            encoding,
        })
    }

    fn display_results<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        surface.set_results_visible(true);
        surface.set_stats(&loaded.stats.cards());
        for section in SectionId::ALL {
            surface.set_section_visible(section, self.sections.is_active(section));
        }
        for section in self.sections.active_in_order() {
            self.render_section(section, surface);
        }
    }

    pub fn toggle_section<S: Surface + ?Sized>(
        &mut self,
        section: SectionId,
        surface: &mut S,
    ) -> SectionTransition {
        let transition = self.sections.toggle(section);
        match transition {
            SectionTransition::Shown(s) => surface.set_section_visible(s, true),
            SectionTransition::Hidden(s) => surface.set_section_visible(s, false),
        }
        debug!(?transition, "section toggled");
        transition
    }

    /// The host reports that a freshly shown section has a sized container.
    pub fn layout_ready<S: Surface + ?Sized>(&mut self, section: SectionId, surface: &mut S) -> bool {
        if self.sections.take_layout_ready(section) {
            self.render_section(section, surface)
        } else {
            false
        }
    }

    /// Draw one section from the current document. Hidden sections and an empty
    /// session are no-ops.
    pub fn render_section<S: Surface + ?Sized>(&self, section: SectionId, surface: &mut S) -> bool {
        match self.chart(section) {
            Some(chart) => {
                surface.plot(section, &chart);
                true
            }
            None => false,
        }
    }

    pub fn chart(&self, section: SectionId) -> Option<ChartDescription> {
        if !self.sections.is_active(section) {
            return None;
        }
        let loaded = self.loaded.as_ref()?;
        Some(chart_for_section(
            section,
            &loaded.document,
            &loaded.encoding,
            &self.config,
        ))
    }
}
