//! Module: db::table
//! Responsibility: one record type stored under a primary index plus any
//! number of secondary indices, kept consistent across put and erase.
//! Does not own: key encoding or cursor traversal.
//! Boundary: a failing `put` or `erase` returns before the first host write.

mod secondary;

use crate::{
    config::TableConfig,
    db::index::{BoundIndex, Index, IndexView},
    error::InternalError,
    host::{KvHost, Namespace, read_value},
    key::{Key, ToKey},
    name::Name,
    obs::sink::{self, MetricsEvent, PutKind},
    serialize::{Record, decode_record, encode_record},
};
use std::{
    any::{TypeId, type_name},
    collections::BTreeSet,
    fmt,
    marker::PhantomData,
};

///
/// Table
///
/// Typed table over a [`KvHost`]. Secondary index entries map the
/// secondary storage key to the primary storage key of their record.
///

pub struct Table<R, H> {
    config: TableConfig,
    namespace: Namespace,
    host: H,
    primary: BoundIndex<R>,
    secondaries: Vec<BoundIndex<R>>,
}

impl<R: Record + 'static, H: KvHost> Table<R, H> {
    #[must_use]
    pub fn builder(config: TableConfig) -> TableBuilder<R, H> {
        TableBuilder {
            config,
            primary: Vec::new(),
            secondaries: Vec::new(),
            _host: PhantomData,
        }
    }
}

impl<R: Record, H: KvHost> Table<R, H> {
    #[must_use]
    pub const fn config(&self) -> &TableConfig {
        &self.config
    }

    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.config.table
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Untyped view of the primary index.
    #[must_use]
    pub const fn primary(&self) -> IndexView<'_, R, H, Key> {
        IndexView::new(self, &self.primary)
    }

    /// Typed view of a registered index.
    pub fn index<K: 'static>(&self, def: Index<R, K>) -> Result<IndexView<'_, R, H, K>, InternalError> {
        let bound = self.bound(def.name())?;
        if !bound.has_key_type(TypeId::of::<K>()) {
            return Err(InternalError::index_misuse(format!(
                "index `{}` on table `{}` is not keyed by `{}`",
                def.name(),
                self.name(),
                type_name::<K>(),
            )));
        }

        Ok(IndexView::new(self, bound))
    }

    /// Untyped view of a registered index, by name.
    pub fn index_named(&self, name: Name) -> Result<IndexView<'_, R, H, Key>, InternalError> {
        self.bound(name).map(|bound| IndexView::new(self, bound))
    }

    /// Names of every index, primary first.
    pub fn index_names(&self) -> impl Iterator<Item = Name> + '_ {
        std::iter::once(&self.primary)
            .chain(&self.secondaries)
            .map(BoundIndex::name)
    }

    /// Insert or replace `record`, keeping every secondary index in step.
    pub fn put(&self, record: &R) -> Result<(), InternalError> {
        let primary_key = self.primary.record_key(record)?;
        let old = self
            .read(&primary_key)?
            .map(|bytes| self.decode(&bytes))
            .transpose()?;

        let value = encode_record(record)?;
        if value.len() > self.config.max_value_bytes {
            return Err(InternalError::table_config(format!(
                "record of {} bytes exceeds max_value_bytes ({}) on table `{}`",
                value.len(),
                self.config.max_value_bytes,
                self.name(),
            )));
        }

        let plan = secondary::plan(self, record, old.as_ref(), &primary_key)?;
        secondary::apply(self, &plan);
        self.host.kv_set(self.namespace, &primary_key, &value);

        let kind = if old.is_some() {
            PutKind::Update
        } else {
            PutKind::Insert
        };
        sink::record(MetricsEvent::Put {
            table: self.name(),
            kind,
        });

        Ok(())
    }

    /// Remove the record with `record`'s primary key; absent records are a
    /// no-op. Secondary entries are derived from the stored record.
    pub fn erase(&self, record: &R) -> Result<(), InternalError> {
        let primary_key = self.primary.record_key(record)?;
        let Some(bytes) = self.read(&primary_key)? else {
            sink::record(MetricsEvent::Erase {
                table: self.name(),
                found: false,
            });
            return Ok(());
        };

        let stored = self.decode(&bytes)?;
        let plan = secondary::plan_erase(self, &stored, &primary_key)?;
        secondary::apply(self, &plan);
        self.host.kv_erase(self.namespace, &primary_key);

        sink::record(MetricsEvent::Erase {
            table: self.name(),
            found: true,
        });

        Ok(())
    }

    pub(crate) fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        read_value(&self.host, self.namespace, key)
    }

    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<R, InternalError> {
        decode_record(bytes, self.config.max_value_bytes).map_err(InternalError::from)
    }

    pub(crate) fn secondaries(&self) -> &[BoundIndex<R>] {
        &self.secondaries
    }

    fn bound(&self, name: Name) -> Result<&BoundIndex<R>, InternalError> {
        std::iter::once(&self.primary)
            .chain(&self.secondaries)
            .find(|bound| bound.name() == name)
            .ok_or_else(|| {
                InternalError::index_misuse(format!(
                    "index `{name}` is not registered on table `{}`",
                    self.name()
                ))
            })
    }
}

impl<R, H> fmt::Debug for Table<R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("config", &self.config)
            .field("namespace", &self.namespace)
            .field("primary", &self.primary)
            .field("secondaries", &self.secondaries)
            .finish_non_exhaustive()
    }
}

///
/// TableBuilder
///
/// Collects index definitions; `build` binds them and validates the set.
///

pub struct TableBuilder<R, H> {
    config: TableConfig,
    primary: Vec<BoundIndex<R>>,
    secondaries: Vec<BoundIndex<R>>,
    _host: PhantomData<fn() -> H>,
}

impl<R: Record + 'static, H: KvHost> TableBuilder<R, H> {
    #[must_use]
    pub fn primary<K: ToKey + 'static>(mut self, def: Index<R, K>) -> Self {
        self.primary
            .push(BoundIndex::bind(self.config.table, def, true));
        self
    }

    #[must_use]
    pub fn secondary<K: ToKey + 'static>(mut self, def: Index<R, K>) -> Self {
        self.secondaries
            .push(BoundIndex::bind(self.config.table, def, false));
        self
    }

    pub fn build(mut self, host: H) -> Result<Table<R, H>, InternalError> {
        self.config.validate()?;

        let table = self.config.table;
        let primary = match (self.primary.pop(), self.primary.is_empty()) {
            (Some(primary), true) => primary,
            (Some(_), false) => {
                return Err(InternalError::table_config(format!(
                    "table `{table}` declares more than one primary index"
                )));
            }
            (None, _) => {
                return Err(InternalError::table_config(format!(
                    "table `{table}` has no primary index"
                )));
            }
        };

        let mut seen = BTreeSet::new();
        for index in std::iter::once(&primary).chain(&self.secondaries) {
            if index.name().is_empty() {
                return Err(InternalError::table_config(format!(
                    "table `{table}` has an index with an empty name"
                )));
            }
            if !seen.insert(index.name()) {
                return Err(InternalError::table_config(format!(
                    "table `{table}` declares index `{}` twice",
                    index.name()
                )));
            }
        }

        Ok(Table {
            namespace: Namespace::new(self.config.db, self.config.contract),
            config: self.config,
            host,
            primary,
            secondaries: self.secondaries,
        })
    }
}
