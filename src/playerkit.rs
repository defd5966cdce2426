// Equipment composer: builds the male and female playerkits for a list of items.

use crate::catalog::{ItemCatalog, ItemDefinition, NO_WEAR_POS};
use crate::error::RenderError;

/// Number of body-part slots in a playerkit.
pub const KIT_SLOTS: usize = 12;

/// Added to an item id to select its worn model, as opposed to a base body model.
pub const EQUIPPED_ITEM_OFFSET: i32 = 2048;

const MALE_BASE_KIT: [i32; KIT_SLOTS] = [0, 0, 0, 0, 274, 0, 282, 292, 259, 289, 298, 270];
const MALE_COLORS: [i32; 5] = [0, 6, 9, 0, 1];

const FEMALE_BASE_KIT: [i32; KIT_SLOTS] = [0, 0, 0, 0, 312, 0, 320, 326, 382, 324, 336, 552];
const FEMALE_COLORS: [i32; 5] = [5, 19, 9, 1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn is_female(self) -> bool {
        matches!(self, Gender::Female)
    }
}

/// Model ids shown per body-part slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerKit([i32; KIT_SLOTS]);

impl PlayerKit {
    /// The mannequin every request starts from.
    pub fn base(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self(MALE_BASE_KIT),
            Gender::Female => Self(FEMALE_BASE_KIT),
        }
    }

    pub fn from_slots(slots: [i32; KIT_SLOTS]) -> Self {
        Self(slots)
    }

    pub fn slots(&self) -> &[i32] {
        &self.0
    }
}

/// Dye indices applied to a kit. Constant per gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorKit([i32; 5]);

impl ColorKit {
    pub fn base(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self(MALE_COLORS),
            Gender::Female => Self(FEMALE_COLORS),
        }
    }

    pub fn values(&self) -> &[i32] {
        &self.0
    }
}

fn slot_index(wear_pos: i32) -> Option<usize> {
    usize::try_from(wear_pos).ok().filter(|&slot| slot < KIT_SLOTS)
}

/// Returns `kit` with `item` worn: its model goes into `wear_pos1` and the
/// slots named by `wear_pos2`/`wear_pos3` are cleared. Whatever previously
/// occupied those slots is overwritten.
///
/// The input kit is never modified. A `wear_pos1` outside the kit is a catalog
/// fault; `compose_kits` rejects such items before calling this.
pub fn equip(kit: &PlayerKit, item: &ItemDefinition) -> PlayerKit {
    let mut equipped = *kit;

    debug_assert!(item.is_equippable(), "item {} has no wear slot", item.id);
    if let Some(slot) = slot_index(item.wear_pos1) {
        equipped.0[slot] = item.id + EQUIPPED_ITEM_OFFSET;
    }

    for extra in [item.wear_pos2, item.wear_pos3] {
        if extra == NO_WEAR_POS {
            continue;
        }
        if let Some(slot) = slot_index(extra) {
            equipped.0[slot] = 0;
        }
    }

    equipped
}

/// Both mannequins with every requested item equipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedKits {
    pub male: PlayerKit,
    pub female: PlayerKit,
    pub male_colors: ColorKit,
    pub female_colors: ColorKit,
    /// Decided by the last item of the request only.
    pub render_chatheads: bool,
    pub item_names: Vec<String>,
}

impl ComposedKits {
    pub fn kit(&self, gender: Gender) -> (&PlayerKit, &ColorKit) {
        match gender {
            Gender::Male => (&self.male, &self.male_colors),
            Gender::Female => (&self.female, &self.female_colors),
        }
    }
}

/// Folds `equip` over both base kits in request order.
///
/// Fails before touching anything else if an id is unknown or not equippable.
pub fn compose_kits(catalog: &ItemCatalog, item_ids: &[i32]) -> Result<ComposedKits, RenderError> {
    let mut male = PlayerKit::base(Gender::Male);
    let mut female = PlayerKit::base(Gender::Female);
    let mut item_names = Vec::with_capacity(item_ids.len());
    let mut last_item: Option<&ItemDefinition> = None;

    for &item_id in item_ids {
        let item = catalog
            .lookup(item_id)
            .map_err(|_| RenderError::UnknownItem(item_id))?;
        if !item.is_equippable() {
            return Err(RenderError::UnequippableItem(item_id));
        }

        male = equip(&male, item);
        female = equip(&female, item);
        item_names.push(item.name.clone());
        last_item = Some(item);
    }

    let last_item = last_item
        .ok_or_else(|| RenderError::Validation("at least one item id is required".to_string()))?;

    Ok(ComposedKits {
        male,
        female,
        male_colors: ColorKit::base(Gender::Male),
        female_colors: ColorKit::base(Gender::Female),
        render_chatheads: last_item.is_head_item(),
        item_names,
    })
}
