use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Код клавиши в нумерации X11 (evdev код + 8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// Зарезервированный код "клавиша не назначена"
    pub const ANY: KeyCode = KeyCode(0);

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Маска модификаторов с битами X11
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierMask(pub u16);

impl ModifierMask {
    pub const NONE: ModifierMask = ModifierMask(0);
    pub const SHIFT: ModifierMask = ModifierMask(1 << 0);
    pub const LOCK: ModifierMask = ModifierMask(1 << 1);
    pub const CONTROL: ModifierMask = ModifierMask(1 << 2);
    pub const MOD1: ModifierMask = ModifierMask(1 << 3);
    pub const MOD2: ModifierMask = ModifierMask(1 << 4);
    pub const MOD3: ModifierMask = ModifierMask(1 << 5);
    pub const MOD4: ModifierMask = ModifierMask(1 << 6);
    pub const MOD5: ModifierMask = ModifierMask(1 << 7);
    pub const ANY_MODIFIER: ModifierMask = ModifierMask(1 << 15);

    /// Имена модификаторов в том виде, в котором они пишутся в конфиге.
    /// Порядок совпадает с порядком проверки при разборе.
    pub const NAMED: [(&'static str, ModifierMask); 9] = [
        ("AnyModifier", Self::ANY_MODIFIER),
        ("Shift", Self::SHIFT),
        ("Lock", Self::LOCK),
        ("Control", Self::CONTROL),
        ("Mod1", Self::MOD1),
        ("Mod2", Self::MOD2),
        ("Mod3", Self::MOD3),
        ("Mod4", Self::MOD4),
        ("Mod5", Self::MOD5),
    ];

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: ModifierMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: ModifierMask, enabled: bool) -> Self {
        if enabled {
            self | other
        } else {
            self
        }
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, mask)| self.contains(*mask))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for ModifierMask {
    type Output = ModifierMask;

    fn bitor(self, rhs: ModifierMask) -> ModifierMask {
        ModifierMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierMask {
    fn bitor_assign(&mut self, rhs: ModifierMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Сочетание клавиш: код клавиши + точная маска модификаторов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub keycode: KeyCode,
    pub modifiers: ModifierMask,
}

impl Shortcut {
    /// Сочетание без назначенной клавиши. Такие записи не захватываются.
    pub const UNBOUND: Shortcut = Shortcut {
        keycode: KeyCode::ANY,
        modifiers: ModifierMask::NONE,
    };

    pub fn new(keycode: u32, modifiers: ModifierMask) -> Self {
        Self {
            keycode: KeyCode(keycode),
            modifiers,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.keycode != KeyCode::ANY
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.keycode)
        } else {
            write!(f, "{}+{}", self.keycode, self.modifiers)
        }
    }
}

/// Нажатие клавиши, доставленное захватчиком
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub keycode: KeyCode,
    pub modifiers: ModifierMask,
}

impl KeyPress {
    pub fn new(keycode: u32, modifiers: ModifierMask) -> Self {
        Self {
            keycode: KeyCode(keycode),
            modifiers,
        }
    }

    /// Точное совпадение кода и маски
    pub fn matches(&self, shortcut: &Shortcut) -> bool {
        self.keycode == shortcut.keycode && self.modifiers == shortcut.modifiers
    }

    pub fn as_shortcut(&self) -> Shortcut {
        Shortcut {
            keycode: self.keycode,
            modifiers: self.modifiers,
        }
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_shortcut())
    }
}
