//! Overlay flags and the record a workflow is aimed at.
//!
//! Each modal owns its own open flag. Opening one while another is open is
//! left to the caller; nothing here enforces mutual exclusion.

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use crate::domain::audience::AudienceRecord;

/// One modal's visibility plus the data it was opened with.
///
/// `M` only tags the modal at the type level so two modals with the same
/// data type cannot be mixed up.
pub struct ModalState<M, D = ()> {
    is_open: bool,
    data: D,
    _marker: PhantomData<M>,
}

impl<M, D: Default> Default for ModalState<M, D> {
    fn default() -> Self {
        Self {
            is_open: false,
            data: D::default(),
            _marker: PhantomData,
        }
    }
}

impl<M, D: Clone> Clone for ModalState<M, D> {
    fn clone(&self) -> Self {
        Self {
            is_open: self.is_open,
            data: self.data.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M, D: Debug> Debug for ModalState<M, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalState")
            .field("is_open", &self.is_open)
            .field("data", &self.data)
            .finish()
    }
}

impl<M, D> ModalState<M, D> {
    /// Sets the data first, then marks the modal open.
    pub fn open(&mut self, data: D) {
        self.data = data;
        self.is_open = true;
    }

    /// Data is kept until the next `open`.
    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn set_data(&mut self, data: D) {
        self.data = data;
    }
}

#[derive(Debug)]
pub struct CreateModal;

#[derive(Debug)]
pub struct ImportModal;

#[derive(Debug)]
pub struct MessageModal;

#[derive(Debug, Default)]
pub struct ModalCoordinator {
    create: ModalState<CreateModal>,
    import: ModalState<ImportModal>,
    /// Carries the targeted record while open.
    message: ModalState<MessageModal, Option<AudienceRecord>>,
}

impl ModalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_create(&mut self) {
        self.create.open(());
    }

    pub fn close_create(&mut self) {
        self.create.close();
    }

    pub fn is_create_open(&self) -> bool {
        self.create.is_open()
    }

    pub fn open_import(&mut self) {
        self.import.open(());
    }

    pub fn close_import(&mut self) {
        self.import.close();
    }

    pub fn is_import_open(&self) -> bool {
        self.import.is_open()
    }

    /// Targets `record` and opens the message modal.
    pub fn open_message(&mut self, record: AudienceRecord) {
        self.message.open(Some(record));
    }

    /// Closes the message modal and drops the target, sent or not.
    pub fn close_message(&mut self) {
        self.message.close();
        self.message.set_data(None);
    }

    pub fn is_message_open(&self) -> bool {
        self.message.is_open()
    }

    pub fn selected(&self) -> Option<&AudienceRecord> {
        self.message.data().as_ref()
    }

    /// True when any overlay is showing.
    pub fn any_open(&self) -> bool {
        self.create.is_open() || self.import.is_open() || self.message.is_open()
    }
}
